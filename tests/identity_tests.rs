//! 域名归一化不依赖工作目录中的任何文件
//!
//! Kept in its own test binary: it changes the process working directory.

use geolocator::identity::{Identity, classify};
use tempfile::TempDir;

#[test]
fn test_suffix_cache_in_working_directory_is_ignored() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(".tld_cache"), r#"["com"]"#).unwrap();
    std::fs::write(dir.path().join("public_suffix_list.dat"), "com\n").unwrap();
    std::env::set_current_dir(dir.path()).unwrap();

    assert_eq!(
        classify("foo.bar.example.co.uk").unwrap(),
        Identity::Url("example.co.uk".to_string())
    );
    assert_eq!(
        classify("https://www.shop.example.com.au/cart").unwrap(),
        Identity::Url("example.com.au".to_string())
    );
    assert_eq!(
        classify("api.example.com").unwrap(),
        Identity::Url("example.com".to_string())
    );
}

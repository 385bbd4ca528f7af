use crate::storage::models::{Coordinates, GeoMetadata, GeoRecord, NewGeoRecord};
use migration::entities::geolocation;

/// 将 Sea-ORM Model 转换为 GeoRecord
pub fn model_to_record(model: geolocation::Model) -> GeoRecord {
    GeoRecord {
        id: model.id,
        ip: model.ip,
        url: model.url,
        coordinates: Coordinates::new(model.longitude, model.latitude),
        metadata: GeoMetadata {
            country_code: model.country_code,
            country_name: model.country_name,
            region_code: model.region_code,
            city: model.city,
        },
        created_at: model.created_at,
    }
}

/// 将 NewGeoRecord 转换为 ActiveModel（id 由数据库生成）
pub fn new_record_to_active_model(record: &NewGeoRecord) -> geolocation::ActiveModel {
    use sea_orm::ActiveValue::*;

    geolocation::ActiveModel {
        id: NotSet,
        ip: Set(record.ip.clone()),
        url: Set(record.url.clone()),
        longitude: Set(record.coordinates.longitude),
        latitude: Set(record.coordinates.latitude),
        country_code: Set(record.metadata.country_code.clone()),
        country_name: Set(record.metadata.country_name.clone()),
        region_code: Set(record.metadata.region_code.clone()),
        city: Set(record.metadata.city.clone()),
        created_at: Set(record.created_at),
    }
}

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 geolocations 表
        manager
            .create_table(
                Table::create()
                    .table(Geolocation::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Geolocation::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Geolocation::Ip).string_len(45).null())
                    .col(ColumnDef::new(Geolocation::Url).string_len(255).null())
                    .col(ColumnDef::new(Geolocation::Longitude).double().not_null())
                    .col(ColumnDef::new(Geolocation::Latitude).double().not_null())
                    .col(ColumnDef::new(Geolocation::CountryCode).string_len(3).null())
                    .col(
                        ColumnDef::new(Geolocation::CountryName)
                            .string_len(100)
                            .null(),
                    )
                    .col(ColumnDef::new(Geolocation::RegionCode).string_len(10).null())
                    .col(ColumnDef::new(Geolocation::City).string_len(100).null())
                    .col(
                        ColumnDef::new(Geolocation::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ip / url 各自唯一（NULL 不参与冲突）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_geolocations_ip")
                    .table(Geolocation::Table)
                    .col(Geolocation::Ip)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_geolocations_url")
                    .table(Geolocation::Table)
                    .col(Geolocation::Url)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 最近记录列表按 created_at 倒序
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_geolocations_created_at")
                    .table(Geolocation::Table)
                    .col(Geolocation::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_geolocations_created_at").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_geolocations_url").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_geolocations_ip").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Geolocation::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Geolocation {
    #[sea_orm(iden = "geolocations")]
    Table,
    Id,
    Ip,
    Url,
    Longitude,
    Latitude,
    CountryCode,
    CountryName,
    RegionCode,
    City,
    CreatedAt,
}

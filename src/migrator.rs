use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_users_table::Migration),
            Box::new(m20240101_000002_create_orders_table::Migration),
            Box::new(m20240101_000003_create_order_details_tables::Migration),
            Box::new(m20240101_000004_create_catalog_tables::Migration),
            Box::new(m20240101_000005_create_products_table::Migration),
            Box::new(m20240101_000006_create_voucher_tables::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_users_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_users_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Users::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Users::Username)
                                .string_len(150)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Users::Email).string_len(254).null())
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Users {
        Table,
        Id,
        Username,
        Email,
        CreatedAt,
    }
}

mod m20240101_000002_create_orders_table {
    use super::m20240101_000001_create_users_table::Users;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Orders::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Orders::UserId).integer().not_null())
                        .col(
                            ColumnDef::new(Orders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_user_id")
                                .from(Orders::Table, Orders::UserId)
                                .to(Users::Table, Users::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_user_id")
                        .table(Orders::Table)
                        .col(Orders::UserId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_created_at")
                        .table(Orders::Table)
                        .col(Orders::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Orders {
        Table,
        Id,
        UserId,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_order_details_tables {
    use super::m20240101_000002_create_orders_table::Orders;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_order_details_tables"
        }
    }

    /// One-to-one detail tables share the unique, cascading `order_id` column.
    fn owned_by_order<T: Iden + Copy + 'static>(
        table: T,
        id: T,
        order_id: T,
        fk_name: &str,
    ) -> TableCreateStatement {
        Table::create()
            .table(table)
            .if_not_exists()
            .col(
                ColumnDef::new(id)
                    .integer()
                    .not_null()
                    .auto_increment()
                    .primary_key(),
            )
            .col(ColumnDef::new(order_id).integer().not_null().unique_key())
            .foreign_key(
                ForeignKey::create()
                    .name(fk_name)
                    .from(table, order_id)
                    .to(Orders::Table, Orders::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .on_update(ForeignKeyAction::Cascade),
            )
            .to_owned()
    }

    fn power(col: PrescriptionDetails) -> ColumnDef {
        ColumnDef::new(col).decimal_len(5, 2).null().to_owned()
    }

    fn axis(col: PrescriptionDetails) -> ColumnDef {
        ColumnDef::new(col).small_integer().null().to_owned()
    }

    fn pupillary_distance(col: PrescriptionDetails) -> ColumnDef {
        ColumnDef::new(col).decimal_len(5, 1).null().to_owned()
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    owned_by_order(
                        Identities::Table,
                        Identities::Id,
                        Identities::OrderId,
                        "fk_identities_order_id",
                    )
                    .col(
                        ColumnDef::new(Identities::FirstName)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Identities::LastName)
                            .string_len(100)
                            .not_null(),
                    )
                    .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    owned_by_order(
                        Contacts::Table,
                        Contacts::Id,
                        Contacts::OrderId,
                        "fk_contacts_order_id",
                    )
                    .col(
                        ColumnDef::new(Contacts::PhoneNumber)
                            .string_len(17)
                            .not_null()
                            .default(""),
                    )
                    .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    owned_by_order(
                        Institutions::Table,
                        Institutions::Id,
                        Institutions::OrderId,
                        "fk_institutions_order_id",
                    )
                    .col(
                        ColumnDef::new(Institutions::Title)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Institutions::Address).text().not_null())
                    .to_owned(),
                )
                .await?;

            use PrescriptionDetails as P;
            manager
                .create_table(
                    owned_by_order(P::Table, P::Id, P::OrderId, "fk_prescription_details_order_id")
                        .col(power(P::FarOdSpheric))
                        .col(power(P::FarOdCylindric))
                        .col(axis(P::FarOdAxis))
                        .col(power(P::FarOsSpheric))
                        .col(power(P::FarOsCylindric))
                        .col(axis(P::FarOsAxis))
                        .col(pupillary_distance(P::FarPupillaryDistance))
                        .col(power(P::NearOdSpheric))
                        .col(power(P::NearOdCylindric))
                        .col(axis(P::NearOdAxis))
                        .col(power(P::NearOsSpheric))
                        .col(power(P::NearOsCylindric))
                        .col(axis(P::NearOsAxis))
                        .col(pupillary_distance(P::NearPupillaryDistance))
                        .col(power(P::IntermediateOdSpheric))
                        .col(power(P::IntermediateOdCylindric))
                        .col(axis(P::IntermediateOdAxis))
                        .col(power(P::IntermediateOsSpheric))
                        .col(power(P::IntermediateOsCylindric))
                        .col(axis(P::IntermediateOsAxis))
                        .col(pupillary_distance(P::IntermediatePupillaryDistance))
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PrescriptionDetails::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Institutions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Contacts::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Identities::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden, Clone, Copy)]
    enum Identities {
        Table,
        Id,
        OrderId,
        FirstName,
        LastName,
    }

    #[derive(DeriveIden, Clone, Copy)]
    enum Contacts {
        Table,
        Id,
        OrderId,
        PhoneNumber,
    }

    #[derive(DeriveIden, Clone, Copy)]
    enum Institutions {
        Table,
        Id,
        OrderId,
        Title,
        Address,
    }

    #[derive(DeriveIden, Clone, Copy)]
    enum PrescriptionDetails {
        Table,
        Id,
        OrderId,
        FarOdSpheric,
        FarOdCylindric,
        FarOdAxis,
        FarOsSpheric,
        FarOsCylindric,
        FarOsAxis,
        FarPupillaryDistance,
        NearOdSpheric,
        NearOdCylindric,
        NearOdAxis,
        NearOsSpheric,
        NearOsCylindric,
        NearOsAxis,
        NearPupillaryDistance,
        IntermediateOdSpheric,
        IntermediateOdCylindric,
        IntermediateOdAxis,
        IntermediateOsSpheric,
        IntermediateOsCylindric,
        IntermediateOsAxis,
        IntermediatePupillaryDistance,
    }

}

mod m20240101_000004_create_catalog_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Frames::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Frames::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Frames::Title).string_len(200).not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(GlassTypes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(GlassTypes::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(GlassTypes::Distance)
                                .string_len(20)
                                .not_null()
                                .default("NEAR"),
                        )
                        .col(ColumnDef::new(GlassTypes::Treatment).string_len(20).null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Lenses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Lenses::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Lenses::Title).text().not_null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Lenses::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(GlassTypes::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Frames::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Frames {
        Table,
        Id,
        Title,
    }

    #[derive(DeriveIden)]
    pub(super) enum GlassTypes {
        Table,
        Id,
        Distance,
        Treatment,
    }

    #[derive(DeriveIden)]
    pub(super) enum Lenses {
        Table,
        Id,
        Title,
    }
}

mod m20240101_000005_create_products_table {
    use super::m20240101_000002_create_orders_table::Orders;
    use super::m20240101_000004_create_catalog_tables::{Frames, GlassTypes, Lenses};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_products_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Products::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Products::OrderId).integer().not_null())
                        .col(ColumnDef::new(Products::FrameId).integer().not_null())
                        .col(ColumnDef::new(Products::GlassTypeId).integer().not_null())
                        .col(ColumnDef::new(Products::LensId).integer().not_null())
                        .col(
                            ColumnDef::new(Products::Price)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_products_order_id")
                                .from(Products::Table, Products::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_products_frame_id")
                                .from(Products::Table, Products::FrameId)
                                .to(Frames::Table, Frames::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_products_glass_type_id")
                                .from(Products::Table, Products::GlassTypeId)
                                .to(GlassTypes::Table, GlassTypes::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_products_lens_id")
                                .from(Products::Table, Products::LensId)
                                .to(Lenses::Table, Lenses::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_order_id")
                        .table(Products::Table)
                        .col(Products::OrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Products {
        Table,
        Id,
        OrderId,
        FrameId,
        GlassTypeId,
        LensId,
        Price,
    }
}

mod m20240101_000006_create_voucher_tables {
    use super::m20240101_000002_create_orders_table::Orders;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_voucher_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Vouchers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Vouchers::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Vouchers::PaymentMethod)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Vouchers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(VoucherOrders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(VoucherOrders::VoucherId).integer().not_null())
                        .col(ColumnDef::new(VoucherOrders::OrderId).integer().not_null())
                        .primary_key(
                            Index::create()
                                .col(VoucherOrders::VoucherId)
                                .col(VoucherOrders::OrderId),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_voucher_orders_voucher_id")
                                .from(VoucherOrders::Table, VoucherOrders::VoucherId)
                                .to(Vouchers::Table, Vouchers::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_voucher_orders_order_id")
                                .from(VoucherOrders::Table, VoucherOrders::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(VoucherLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(VoucherLines::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(VoucherLines::VoucherId).integer().not_null())
                        .col(
                            ColumnDef::new(VoucherLines::Amount)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(VoucherLines::PaymentDate).date().not_null())
                        .col(ColumnDef::new(VoucherLines::PaymentRef).string_len(100).null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_voucher_lines_voucher_id")
                                .from(VoucherLines::Table, VoucherLines::VoucherId)
                                .to(Vouchers::Table, Vouchers::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_voucher_lines_voucher_id")
                        .table(VoucherLines::Table)
                        .col(VoucherLines::VoucherId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(VoucherLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(VoucherOrders::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Vouchers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Vouchers {
        Table,
        Id,
        PaymentMethod,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum VoucherOrders {
        Table,
        VoucherId,
        OrderId,
    }

    #[derive(DeriveIden)]
    enum VoucherLines {
        Table,
        Id,
        VoucherId,
        Amount,
        PaymentDate,
        PaymentRef,
    }
}

use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Customers {
    Table,
    Id,
    Name,
    LoginChannel,
    Phone,
    MembershipType,
    TotalRecharged,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Providers {
    Table,
    Id,
    Name,
    SkillTier,
    Account,
    Role,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Reservations {
    Table,
    Id,
    Date,
    TimeSlot,
    CustomerId,
    ProviderId,
    Note,
    FinalPrice,
    Currency,
    PaymentMethod,
    DepositPaid,
    IsAcknowledged,
    MembershipSnapshot,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum RechargeRecords {
    Table,
    Id,
    CustomerId,
    Amount,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Customers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Customers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Customers::Name).string().not_null())
                    .col(ColumnDef::new(Customers::LoginChannel).string().null())
                    .col(ColumnDef::new(Customers::Phone).string().null())
                    .col(
                        ColumnDef::new(Customers::MembershipType)
                            .string_len(16)
                            .not_null()
                            .default("free"),
                    )
                    .col(
                        ColumnDef::new(Customers::TotalRecharged)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Customers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Customers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Providers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Providers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Providers::Name).string().not_null())
                    .col(ColumnDef::new(Providers::SkillTier).string().not_null())
                    .col(
                        ColumnDef::new(Providers::Account)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Providers::Role)
                            .string_len(16)
                            .not_null()
                            .default("staff"),
                    )
                    .col(
                        ColumnDef::new(Providers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Providers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Reservations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reservations::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Reservations::Date).date().not_null())
                    .col(ColumnDef::new(Reservations::TimeSlot).string_len(8).not_null())
                    .col(
                        ColumnDef::new(Reservations::CustomerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Reservations::ProviderId).big_integer().null())
                    .col(ColumnDef::new(Reservations::Note).text().null())
                    .col(ColumnDef::new(Reservations::FinalPrice).big_integer().null())
                    .col(
                        ColumnDef::new(Reservations::Currency)
                            .string_len(8)
                            .not_null()
                            .default("KRW"),
                    )
                    .col(
                        ColumnDef::new(Reservations::PaymentMethod)
                            .string_len(16)
                            .null(),
                    )
                    .col(ColumnDef::new(Reservations::DepositPaid).boolean().null())
                    .col(
                        ColumnDef::new(Reservations::IsAcknowledged)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Reservations::MembershipSnapshot)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reservations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Reservations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservations_customer")
                            .from(Reservations::Table, Reservations::CustomerId)
                            .to(Customers::Table, Customers::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservations_provider")
                            .from(Reservations::Table, Reservations::ProviderId)
                            .to(Providers::Table, Providers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // 按日期/顾客的日历与账单查询都走这两个索引
        manager
            .create_index(
                Index::create()
                    .name("idx_reservations_date")
                    .table(Reservations::Table)
                    .col(Reservations::Date)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_reservations_customer")
                    .table(Reservations::Table)
                    .col(Reservations::CustomerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RechargeRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RechargeRecords::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RechargeRecords::CustomerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RechargeRecords::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RechargeRecords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recharge_records_customer")
                            .from(RechargeRecords::Table, RechargeRecords::CustomerId)
                            .to(Customers::Table, Customers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RechargeRecords::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Reservations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Providers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Customers::Table).to_owned())
            .await?;
        Ok(())
    }
}

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 同一天同一时段同一美甲师只能有一条预约。未指派美甲师的预约不受限，
        // 所以用部分唯一索引而不是普通唯一约束。冲突由插入时的唯一键错误暴露。
        let sql = r#"
            CREATE UNIQUE INDEX IF NOT EXISTS uq_reservations_date_slot_provider
            ON reservations (date, time_slot, provider_id)
            WHERE provider_id IS NOT NULL
        "#;
        manager.get_connection().execute_unprepared(sql).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP INDEX IF EXISTS uq_reservations_date_slot_provider")
            .await?;
        Ok(())
    }
}

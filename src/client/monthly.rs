use crate::client::store::{LocalStore, RESERVATION_MONTHS_KEY};
use crate::models::ReservationResponse;
use crate::utils::cutoff_month_key;
use chrono::NaiveDate;
use std::collections::HashMap;

/// 单个月份条目的状态：缺失（不在表里）→ 拉取中 → 已填充。
/// 已填充的条目永远是整月快照，不存在半个月。
#[derive(Debug, Clone, PartialEq)]
pub enum MonthEntry {
    Loading,
    Populated(Vec<ReservationResponse>),
}

/// `patch_locally` 的回滚凭据：被改那行的原样。
#[derive(Debug, Clone)]
pub struct PatchUndo {
    month_key: String,
    before: ReservationResponse,
}

/// 店端日历的月份缓存。
///
/// 单线程持有（全部 `&mut self` 接口），每次变更都写穿到 [`LocalStore`]，
/// 重启后还在。网络拉取本身在外面做，这里只管状态：`begin_fetch` 标记
/// 拉取中，响应到了喂给 `complete_fetch`。按月份键落位，晚到的 A 月响应
/// 不会碰 B 月，同一个键以到达顺序覆盖（last-write-wins）。
pub struct MonthlyCache {
    store: LocalStore,
    months: HashMap<String, MonthEntry>,
}

impl MonthlyCache {
    /// 两阶段启动：先从存储恢复，再应用删除对账，然后才能读。
    ///
    /// 顺序由构造函数锁死 —— 要是先读缓存再对账，已删除的预约会在
    /// 界面上闪现一次。
    pub fn open(store: LocalStore, deleted_ids: &[String]) -> Self {
        let persisted: HashMap<String, Vec<ReservationResponse>> =
            store.read_json(RESERVATION_MONTHS_KEY).unwrap_or_default();

        let mut cache = Self {
            store,
            months: persisted
                .into_iter()
                .map(|(key, rows)| (key, MonthEntry::Populated(rows)))
                .collect(),
        };

        for id in deleted_ids {
            cache.reconcile_deletion(id);
        }

        cache
    }

    /// 已填充月份的快照；拉取中或缺失返回 None，调用方去 `begin_fetch`。
    pub fn get(&self, month_key: &str) -> Option<&[ReservationResponse]> {
        match self.months.get(month_key) {
            Some(MonthEntry::Populated(rows)) => Some(rows),
            _ => None,
        }
    }

    /// 需要发起网络拉取时标记拉取中并返回 true；
    /// 已填充或已有拉取在路上返回 false。
    pub fn begin_fetch(&mut self, month_key: &str) -> bool {
        if self.months.contains_key(month_key) {
            return false;
        }
        self.months
            .insert(month_key.to_string(), MonthEntry::Loading);
        true
    }

    /// 响应到达即按键写入并持久化。
    pub fn complete_fetch(&mut self, month_key: &str, rows: Vec<ReservationResponse>) {
        self.months
            .insert(month_key.to_string(), MonthEntry::Populated(rows));
        self.persist();
    }

    /// 拉取失败回到缺失态，下次还会重试。
    pub fn abort_fetch(&mut self, month_key: &str) {
        if matches!(self.months.get(month_key), Some(MonthEntry::Loading)) {
            self.months.remove(month_key);
        }
    }

    /// 作废某月，下一次读强制回源。变更影响面在本地算不清时用这个。
    pub fn invalidate(&mut self, month_key: &str) {
        self.months.remove(month_key);
        self.persist();
    }

    /// 低风险界面态的就地乐观补丁（比如已读标记），不回源。
    /// 返回回滚凭据，对应的服务端调用失败后拿它 `undo_patch`。
    pub fn patch_locally<F>(&mut self, reservation_id: &str, mutate: F) -> Option<PatchUndo>
    where
        F: FnOnce(&mut ReservationResponse),
    {
        let mut undo = None;
        for (key, entry) in self.months.iter_mut() {
            if let MonthEntry::Populated(rows) = entry
                && let Some(row) = rows.iter_mut().find(|r| r.id == reservation_id)
            {
                let before = row.clone();
                mutate(row);
                undo = Some(PatchUndo {
                    month_key: key.clone(),
                    before,
                });
                break;
            }
        }

        if undo.is_some() {
            self.persist();
        }
        undo
    }

    /// 回滚一次乐观补丁。
    pub fn undo_patch(&mut self, undo: PatchUndo) {
        if let Some(MonthEntry::Populated(rows)) = self.months.get_mut(&undo.month_key)
            && let Some(row) = rows.iter_mut().find(|r| r.id == undo.before.id)
        {
            *row = undo.before;
            self.persist();
        }
    }

    /// 外部带回的删除信号：把该预约从所有缓存月份里剔掉。
    pub fn reconcile_deletion(&mut self, reservation_id: &str) -> bool {
        let mut removed = false;
        for entry in self.months.values_mut() {
            if let MonthEntry::Populated(rows) = entry {
                let len_before = rows.len();
                rows.retain(|r| r.id != reservation_id);
                removed |= rows.len() != len_before;
            }
        }

        if removed {
            self.persist();
        }
        removed
    }

    /// 清掉比 `today - days` 所在月份更早的条目。进程启动时跑一次。
    pub fn evict_older_than(&mut self, days: i64, today: NaiveDate) {
        let cutoff = cutoff_month_key(today, days);
        let len_before = self.months.len();
        self.months.retain(|key, _| *key >= cutoff);

        if self.months.len() != len_before {
            self.persist();
        }
    }

    /// 缓存里的月份键，测试和诊断用。
    pub fn cached_months(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .months
            .iter()
            .filter(|(_, entry)| matches!(entry, MonthEntry::Populated(_)))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    // 只落已填充的月份，拉取中是瞬态
    fn persist(&self) {
        let snapshot: HashMap<&String, &Vec<ReservationResponse>> = self
            .months
            .iter()
            .filter_map(|(key, entry)| match entry {
                MonthEntry::Populated(rows) => Some((key, rows)),
                MonthEntry::Loading => None,
            })
            .collect();
        self.store.write_json(RESERVATION_MONTHS_KEY, &snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MembershipType;
    use chrono::Utc;

    fn row(id: &str, date: &str, slot: &str) -> ReservationResponse {
        ReservationResponse {
            id: id.to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            time_slot: slot.to_string(),
            customer_id: 1,
            provider_id: Some(1),
            note: None,
            final_price: None,
            currency: "KRW".to_string(),
            payment_method: None,
            deposit_paid: None,
            is_acknowledged: false,
            membership_snapshot: MembershipType::Free,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn store(dir: &tempfile::TempDir) -> LocalStore {
        LocalStore::new(dir.path())
    }

    #[test]
    fn test_populated_month_round_trips_through_storage() {
        let dir = tempfile::tempdir().unwrap();

        let mut cache = MonthlyCache::open(store(&dir), &[]);
        assert!(cache.begin_fetch("2025-06"));
        cache.complete_fetch(
            "2025-06",
            vec![row("a", "2025-06-10", "10:00"), row("b", "2025-06-10", "12:00")],
        );

        // 重启后还在
        let reopened = MonthlyCache::open(store(&dir), &[]);
        let rows = reopened.get("2025-06").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.iter().filter(|r| r.id == "a").count(), 1);
    }

    #[test]
    fn test_deletion_reconciliation_precedes_first_read() {
        let dir = tempfile::tempdir().unwrap();

        let mut cache = MonthlyCache::open(store(&dir), &[]);
        cache.complete_fetch(
            "2025-06",
            vec![row("a", "2025-06-10", "10:00"), row("b", "2025-06-10", "12:00")],
        );

        // 删除信号和缓存恢复同时发生：对账必须抢在任何读之前
        let reopened = MonthlyCache::open(store(&dir), &["a".to_string()]);
        let rows = reopened.get("2025-06").unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows.iter().all(|r| r.id != "a"));

        // 对账结果也落了盘
        let third = MonthlyCache::open(store(&dir), &[]);
        assert!(third.get("2025-06").unwrap().iter().all(|r| r.id != "a"));
    }

    #[test]
    fn test_corrupt_storage_fails_open() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("reservation_months.json"), "]][[").unwrap();

        let mut cache = MonthlyCache::open(store(&dir), &[]);
        assert!(cache.get("2025-06").is_none());
        // 坏缓存当没有缓存，照常可以开始拉取
        assert!(cache.begin_fetch("2025-06"));
    }

    #[test]
    fn test_late_response_does_not_touch_other_month() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = MonthlyCache::open(store(&dir), &[]);

        // A 月拉取发出后用户已经翻到 B 月
        assert!(cache.begin_fetch("2025-05"));
        assert!(cache.begin_fetch("2025-06"));
        cache.complete_fetch("2025-06", vec![row("b", "2025-06-10", "10:00")]);

        // A 月响应姗姗来迟，只落在 A 月
        cache.complete_fetch("2025-05", vec![row("a", "2025-05-20", "14:00")]);

        assert_eq!(cache.get("2025-06").unwrap()[0].id, "b");
        assert_eq!(cache.get("2025-05").unwrap()[0].id, "a");
    }

    #[test]
    fn test_same_key_last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = MonthlyCache::open(store(&dir), &[]);

        cache.complete_fetch("2025-06", vec![row("old", "2025-06-01", "10:00")]);
        cache.complete_fetch("2025-06", vec![row("new", "2025-06-02", "12:00")]);

        let rows = cache.get("2025-06").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "new");
    }

    #[test]
    fn test_begin_fetch_only_once_while_loading() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = MonthlyCache::open(store(&dir), &[]);

        assert!(cache.begin_fetch("2025-06"));
        assert!(!cache.begin_fetch("2025-06"));

        cache.abort_fetch("2025-06");
        assert!(cache.begin_fetch("2025-06"));
    }

    #[test]
    fn test_invalidate_forces_refetch() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = MonthlyCache::open(store(&dir), &[]);

        cache.complete_fetch("2025-06", vec![row("a", "2025-06-10", "10:00")]);
        cache.invalidate("2025-06");

        assert!(cache.get("2025-06").is_none());
        assert!(cache.begin_fetch("2025-06"));
    }

    #[test]
    fn test_patch_locally_and_undo() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = MonthlyCache::open(store(&dir), &[]);
        cache.complete_fetch("2025-06", vec![row("a", "2025-06-10", "10:00")]);

        let undo = cache
            .patch_locally("a", |r| r.is_acknowledged = true)
            .unwrap();
        assert!(cache.get("2025-06").unwrap()[0].is_acknowledged);

        // 服务端失败，回滚到补丁前
        cache.undo_patch(undo);
        assert!(!cache.get("2025-06").unwrap()[0].is_acknowledged);
    }

    #[test]
    fn test_patch_locally_unknown_id_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = MonthlyCache::open(store(&dir), &[]);
        cache.complete_fetch("2025-06", vec![row("a", "2025-06-10", "10:00")]);

        assert!(cache
            .patch_locally("missing", |r| r.is_acknowledged = true)
            .is_none());
    }

    #[test]
    fn test_reconcile_deletion_scans_all_months() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = MonthlyCache::open(store(&dir), &[]);
        cache.complete_fetch("2025-05", vec![row("x", "2025-05-20", "10:00")]);
        cache.complete_fetch("2025-06", vec![row("y", "2025-06-10", "12:00")]);

        assert!(cache.reconcile_deletion("x"));
        assert!(cache.get("2025-05").unwrap().is_empty());
        assert_eq!(cache.get("2025-06").unwrap().len(), 1);

        assert!(!cache.reconcile_deletion("x"));
    }

    #[test]
    fn test_evict_older_than_cutoff_month() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = MonthlyCache::open(store(&dir), &[]);
        for (key, date) in [
            ("2025-01", "2025-01-15"),
            ("2025-02", "2025-02-15"),
            ("2025-03", "2025-03-15"),
            ("2025-06", "2025-06-05"),
        ] {
            cache.complete_fetch(key, vec![row(key, date, "10:00")]);
        }

        let today = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        cache.evict_older_than(90, today); // cutoff = 2025-03

        assert_eq!(cache.cached_months(), vec!["2025-03", "2025-06"]);
    }
}

//! 店内一天可预约的固定时段表。
//!
//! 顺序即营业时间顺序，所有可用时段计算都以这里的顺序为准。

/// 每天可预约的时段标签，按营业时间排列。
pub const SLOT_LABELS: [&str; 5] = ["10:00", "12:00", "14:00", "16:00", "19:00"];

/// 时段是否在时段表内。
pub fn contains(slot: &str) -> bool {
    SLOT_LABELS.contains(&slot)
}

/// 时段在表内的序号，用于按预约先后排序。
pub fn position(slot: &str) -> Option<usize> {
    SLOT_LABELS.iter().position(|s| *s == slot)
}

/// 时段表减去已占用时段，保持原有顺序。
pub fn free_slots(reserved: &[String]) -> Vec<&'static str> {
    SLOT_LABELS
        .iter()
        .copied()
        .filter(|slot| !reserved.iter().any(|r| r == slot))
        .collect()
}

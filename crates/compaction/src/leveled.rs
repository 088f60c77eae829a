use crate::strategy::{CompactionStrategy, LevelView};

/// Per-level byte budgets, L0 through L6. L0 is measured in file count
/// instead of bytes (it holds unsorted, possibly-overlapping flush output,
/// so a byte budget would let one huge flush starve compaction); L1+ use
/// the classic exponentially growing per-level budget.
const L0_OVERLAP_TRIGGER: usize = 4;
const L0_MAX_RUN: usize = 8;

fn level_budget_bytes(level: u32) -> u64 {
    const MB: u64 = 1024 * 1024;
    const GB: u64 = 1024 * MB;
    const TB: u64 = 1024 * GB;
    match level {
        1 => 100 * MB,
        2 => GB,
        3 => 10 * GB,
        4 => 100 * GB,
        5 => TB,
        _ => 10 * TB,
    }
}

/// Per-level compaction: L0 merges overlapping flush output down into L1;
/// every other level compacts its least-recently-accessed files back under
/// that level's byte budget.
#[derive(Default)]
pub struct Leveled;

impl CompactionStrategy for Leveled {
    fn select(&self, view: &LevelView) -> Vec<String> {
        if view.level == 0 {
            if view.files.len() < L0_OVERLAP_TRIGGER {
                return Vec::new();
            }
            return view.files.iter().take(L0_MAX_RUN).map(|f| f.file_id.clone()).collect();
        }

        let budget = level_budget_bytes(view.level);
        if view.total_size_bytes() <= budget {
            return Vec::new();
        }

        let mut by_access: Vec<&catalog::FileRecord> = view.files.iter().collect();
        by_access.sort_by_key(|f| f.last_access_unix_nanos);

        let mut selected = Vec::new();
        let mut remaining = view.total_size_bytes();
        for file in by_access {
            if remaining <= budget {
                break;
            }
            remaining = remaining.saturating_sub(file.size_bytes);
            selected.push(file.file_id.clone());
        }
        selected
    }

    fn priority(&self, view: &LevelView) -> f64 {
        if view.level == 0 {
            return view.files.len() as f64 / L0_OVERLAP_TRIGGER as f64;
        }
        let budget = level_budget_bytes(view.level) as f64;
        let actual = view.total_size_bytes() as f64;
        (actual / budget) * (7.0 - view.level as f64)
    }
}

//! Seed data shared by unit and integration tests
//!
//! Store: "Leave Policy" (IT), "Payroll Calendar" (HR), "Board Minutes"
//! (Admin only). Index: one IT passage about VPN access, one HR passage
//! about payroll, one passage shared by IT and HR about expenses.

use askr_core::{KnowledgeEntry, Role, SearchableDocument};
use askr_knowledge::MemoryKnowledgeStore;
use askr_search::MemorySearchIndex;
use std::sync::Arc;

pub const LEAVE_POLICY_CONTENT: &str = "20 days annual leave";
pub const PAYROLL_CONTENT: &str = "Salaries are paid on the 25th of each month";
pub const BOARD_MINUTES_CONTENT: &str = "Q3 board minutes: acquisition approved";

pub const VPN_PASSAGE: &str = "VPN access requires the corporate WireGuard client";
pub const PAYROLL_PASSAGE: &str = "Payroll corrections must be filed before the 20th";
pub const EXPENSE_PASSAGE: &str = "Expense reports are due at the end of each month";

pub fn leave_policy_entry() -> KnowledgeEntry {
    KnowledgeEntry::new("Leave Policy", LEAVE_POLICY_CONTENT, [Role::It]).with_author("hr-admin")
}

pub fn payroll_entry() -> KnowledgeEntry {
    KnowledgeEntry::new("Payroll Calendar", PAYROLL_CONTENT, [Role::Hr]).with_author("hr-admin")
}

pub fn board_minutes_entry() -> KnowledgeEntry {
    KnowledgeEntry::new("Board Minutes", BOARD_MINUTES_CONTENT, [Role::Admin])
        .with_author("admin")
}

pub fn seeded_store() -> Arc<MemoryKnowledgeStore> {
    Arc::new(MemoryKnowledgeStore::with_entries([
        leave_policy_entry(),
        payroll_entry(),
        board_minutes_entry(),
    ]))
}

pub fn documents() -> Vec<SearchableDocument> {
    vec![
        SearchableDocument::new(VPN_PASSAGE, [Role::It]).with_id("vpn"),
        SearchableDocument::new(PAYROLL_PASSAGE, [Role::Hr]).with_id("payroll"),
        SearchableDocument::new(EXPENSE_PASSAGE, [Role::It, Role::Hr]).with_id("expenses"),
    ]
}

pub fn seeded_index() -> Arc<MemorySearchIndex> {
    Arc::new(MemorySearchIndex::with_documents(documents()))
}

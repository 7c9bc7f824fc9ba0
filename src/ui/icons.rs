//! Shared UI icons.
//!
//! Each icon falls back to a plain ASCII marker on terminals without
//! emoji support.

use console::Emoji;

// Outcome indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static SAVED: Emoji<'_, '_> = Emoji("💾 ", "[SAVED]");

// Run indicators
pub static UPLOAD: Emoji<'_, '_> = Emoji("📤 ", "[UP]");
pub static LINK: Emoji<'_, '_> = Emoji("🔗 ", "[LINK]");
pub static SCOUT: Emoji<'_, '_> = Emoji("🔍 ", "[S]");
pub static ANALYST: Emoji<'_, '_> = Emoji("🧠 ", "[A]");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[i]");
pub static PENDING: Emoji<'_, '_> = Emoji("⏳ ", "[..]");

// Records
pub static TICKET: Emoji<'_, '_> = Emoji("🎫 ", "#");
pub static EXPORT: Emoji<'_, '_> = Emoji("📄 ", "[FILE]");

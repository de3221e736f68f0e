//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `journal_core` linkage: open an
//!   in-memory database, run migrations and role seeding, list the roles.
//! - Keep output deterministic for quick local sanity checks.

use journal_core::db::open_db_in_memory;
use journal_core::repo::role_repo::SqliteRoleRepository;
use journal_core::repo::{ListOrder, PageRequest, RecordStore};
use journal_core::{resolve_scope, Principal, ResourceKind, RoleName};

fn main() {
    println!("journal_core ping={}", journal_core::ping());
    println!("journal_core version={}", journal_core::core_version());

    let conn = match open_db_in_memory() {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("database bootstrap failed: {err}");
            std::process::exit(1);
        }
    };

    let admin = Principal::new(0, "smoke@localhost", &[RoleName::Admin]);
    let scope = match resolve_scope(&admin, ResourceKind::Role, None) {
        Ok(scope) => scope,
        Err(err) => {
            eprintln!("scope resolution failed: {err}");
            std::process::exit(1);
        }
    };

    let roles = SqliteRoleRepository::new(&conn);
    match roles.list(&scope, &ListOrder::by("name", false), &PageRequest::default()) {
        Ok(page) => {
            println!("seeded roles={}", page.total);
            for role in &page.items {
                println!("  {role}");
            }
        }
        Err(err) => {
            eprintln!("role listing failed: {err}");
            std::process::exit(1);
        }
    }
}

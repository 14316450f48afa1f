// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn batch_preserves_command_order() {
    let batch = Batch::new()
        .hdel("grabbed", "0")
        .lpush("available", "0")
        .expire("available", Duration::from_secs(5));

    assert_eq!(batch.len(), 3);
    assert_eq!(
        batch.commands.iter().map(Command::key).collect::<Vec<_>>(),
        vec!["grabbed", "available", "available"]
    );
    assert!(batch.guard.is_none());
}

#[test]
fn require_field_sets_guard() {
    let batch = Batch::new().require_field("grabbed", "1").hdel("grabbed", "1");

    assert_eq!(
        batch.guard,
        Some(BatchGuard::FieldExists {
            key: "grabbed".to_string(),
            field: "1".to_string(),
        })
    );
}

#[test]
fn rpush_collects_values() {
    let batch = Batch::new().rpush("available", (0..3).map(|i| i.to_string()));

    assert_eq!(
        batch.commands[0],
        Command::RPush {
            key: "available".to_string(),
            values: vec!["0".to_string(), "1".to_string(), "2".to_string()],
        }
    );
}

#[test]
fn reply_accessors() {
    assert_eq!(
        Reply::Values(vec!["a".to_string()]).into_values(),
        vec!["a".to_string()]
    );
    assert!(Reply::Ok.into_values().is_empty());
}

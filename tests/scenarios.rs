mod common;

use recordpool::{alloc, free, print_block_usage, print_memory_usage, print_registered_types, register, RegisterError};

/// Parses one `print_block_usage` line for `name` into
/// `(total_blocks, free_blocks, allocated_blocks)`.
fn block_counts(report: &str, name: &str) -> Option<(usize, usize, usize)> {
    let prefix = format!("{name}: ");
    let line = report.lines().find(|l| l.starts_with(&prefix))?;
    let mut total = None;
    let mut free = None;
    let mut allocated = None;
    for field in line.trim_start_matches(&prefix).split_whitespace() {
        let (key, value) = field.split_once('=')?;
        let value: usize = value.parse().ok()?;
        match key {
            "total_blocks" => total = Some(value),
            "free_blocks" => free = Some(value),
            "allocated_blocks" => allocated = Some(value),
            _ => {}
        }
    }
    Some((total?, free?, allocated?))
}

#[test]
fn scenario_1_lazy_arena_growth() {
    let _guard = common::serialize_api();
    common::ensure_init();

    register("ScenarioOneEmployee", 36).unwrap();

    for _ in 0..100 {
        assert!(alloc("ScenarioOneEmployee", 1).is_some());
    }

    let report = print_block_usage();
    let (_total, _free, allocated) = block_counts(&report, "ScenarioOneEmployee").unwrap();
    assert_eq!(allocated, 100);
}

#[test]
fn scenario_2_interleaved_types_share_one_arena_each() {
    let _guard = common::serialize_api();
    common::ensure_init();

    register("ScenarioTwoE", 36).unwrap();
    register("ScenarioTwoS2", 61).unwrap();

    assert!(alloc("ScenarioTwoE", 1).is_some());
    assert!(alloc("ScenarioTwoS2", 1).is_some());
    assert!(alloc("ScenarioTwoE", 1).is_some());
    assert!(alloc("ScenarioTwoS2", 1).is_some());
    assert!(alloc("ScenarioTwoE", 1).is_some());

    let report = print_block_usage();
    let (_, _, e_allocated) = block_counts(&report, "ScenarioTwoE").unwrap();
    let (_, _, s2_allocated) = block_counts(&report, "ScenarioTwoS2").unwrap();
    assert_eq!(e_allocated, 3);
    assert_eq!(s2_allocated, 2);
}

#[test]
fn scenario_3_to_5_free_and_coalesce_releases_arena() {
    let _guard = common::serialize_api();
    common::ensure_init();

    register("ScenarioFiveE", 36).unwrap();

    let first = alloc("ScenarioFiveE", 1).unwrap();
    let middle = alloc("ScenarioFiveE", 1).unwrap();
    let last = alloc("ScenarioFiveE", 1).unwrap();

    // #3: free the middle block -- it becomes an isolated free block.
    free(middle);
    let report = print_block_usage();
    let (total, free_blocks, allocated) = block_counts(&report, "ScenarioFiveE").unwrap();
    assert_eq!(allocated, 2);
    assert!(free_blocks >= 1);
    assert_eq!(total, free_blocks + allocated);

    // #4: free the first block -- it coalesces with the freed middle block.
    free(first);
    let report = print_block_usage();
    let (_, free_blocks_after, allocated_after) = block_counts(&report, "ScenarioFiveE").unwrap();
    assert_eq!(allocated_after, 1);
    assert!(free_blocks_after < free_blocks + 1, "adjacent free blocks must coalesce, not just accumulate");

    // #5: free the last block -- the whole arena coalesces and is released.
    free(last);
    assert_eq!(print_memory_usage(Some("ScenarioFiveE")), "");
    let report = print_block_usage();
    let (total_final, free_final, allocated_final) = block_counts(&report, "ScenarioFiveE").unwrap();
    assert_eq!((total_final, free_final, allocated_final), (0, 0, 0));
}

#[test]
fn scenario_6_oversized_registration_rejected() {
    let _guard = common::serialize_api();
    common::ensure_init();

    let oversized = recordpool::registry::Registry::max_record_size() + 1;
    let result = register("ScenarioSixOversized", oversized);
    assert_eq!(result, Err(RegisterError::SizeTooLarge));
}

#[test]
fn duplicate_registration_is_rejected_and_state_is_unchanged() {
    let _guard = common::serialize_api();
    common::ensure_init();

    register("DuplicateCheckType", 16).unwrap();
    let before = print_registered_types();

    let result = register("DuplicateCheckType", 16);
    assert_eq!(result, Err(RegisterError::DuplicateName));
    assert_eq!(print_registered_types(), before);
}

#[test]
fn init_is_idempotent() {
    common::ensure_init();
    recordpool::init();
    recordpool::init();
}

#[test]
fn boundary_exact_max_record_size_succeeds() {
    let _guard = common::serialize_api();
    common::ensure_init();

    let max = recordpool::registry::Registry::max_record_size();
    register("BoundaryMaxSize", max).unwrap();
    assert!(alloc("BoundaryMaxSize", 1).is_some());
}

#[test]
fn boundary_one_byte_over_max_is_rejected() {
    let _guard = common::serialize_api();
    common::ensure_init();

    let over = recordpool::registry::Registry::max_record_size() + 1;
    let result = register("BoundaryOverSize", over);
    assert_eq!(result, Err(RegisterError::SizeTooLarge));
}

#[test]
fn alloc_request_exceeding_arena_payload_fails() {
    let _guard = common::serialize_api();
    common::ensure_init();

    register("BoundaryUnitOverflow", 64).unwrap();
    let max_units = recordpool::registry::Registry::max_record_size() / 64;
    assert!(alloc("BoundaryUnitOverflow", max_units + 1000).is_none());
}

#[test]
fn alloc_of_unregistered_type_returns_none() {
    let _guard = common::serialize_api();
    common::ensure_init();

    assert!(alloc("NeverRegisteredTypeName", 1).is_none());
}

#[test]
fn allocated_memory_is_zero_initialized() {
    let _guard = common::serialize_api();
    common::ensure_init();

    register("ZeroFillCheck", 64).unwrap();
    let ptr = alloc("ZeroFillCheck", 1).unwrap();
    let bytes = unsafe { core::slice::from_raw_parts(ptr.as_ptr(), 64) };
    assert!(bytes.iter().all(|&b| b == 0));
    free(ptr);
}

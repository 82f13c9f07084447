//! Budget controller behavior tests

use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use vramgov_budget::BudgetController;
use vramgov_core::{BudgetConfig, DeviceTier, PressureLevel, PressureThresholds};

const MIB: u64 = 1024 * 1024;

fn counting_hooks(
    ctl: &mut BudgetController,
    freed_per_cleanup: u64,
) -> (Rc<Cell<u64>>, Rc<Cell<u64>>) {
    let cleanups = Rc::new(Cell::new(0u64));
    let emergencies = Rc::new(Cell::new(0u64));

    let c = Rc::clone(&cleanups);
    ctl.register_cleanup_hook(Box::new(move || {
        c.set(c.get() + 1);
        freed_per_cleanup
    }));

    let e = Rc::clone(&emergencies);
    ctl.register_emergency_hook(Box::new(move || {
        e.set(e.get() + 1);
    }));

    (cleanups, emergencies)
}

#[test]
fn pressure_is_monotonic_in_usage() {
    let config = BudgetConfig::recommended(DeviceTier::Balanced);
    let mut ctl = BudgetController::new(BudgetConfig {
        enable_auto_cleanup: false,
        enable_emergency_purge: false,
        ..config
    });

    let mut last = PressureLevel::None;
    for step in 0..200 {
        let usage = step * 10 * MIB;
        ctl.update_usage(usage);
        let level = ctl.pressure();
        assert!(level >= last, "pressure regressed at usage {}", usage);
        last = level;
    }
    assert_eq!(last, PressureLevel::Critical);
}

#[test]
fn pressure_levels_match_thresholds() {
    let thresholds = PressureThresholds::default();
    assert_eq!(thresholds.level_for_ratio(0.30), PressureLevel::None);
    assert_eq!(thresholds.level_for_ratio(0.60), PressureLevel::Low);
    assert_eq!(thresholds.level_for_ratio(0.75), PressureLevel::Medium);
    assert_eq!(thresholds.level_for_ratio(0.85), PressureLevel::High);
    assert_eq!(thresholds.level_for_ratio(0.95), PressureLevel::Critical);
}

#[test]
fn midrange_scenario_triggers_one_cleanup_then_one_emergency() {
    // Balanced preset: cap 1536 MiB, cleanup at 1280 MiB, emergency at 1460 MiB.
    let mut ctl = BudgetController::new(BudgetConfig::recommended(DeviceTier::Balanced));
    let (cleanups, emergencies) = counting_hooks(&mut ctl, 64 * MIB);

    ctl.update_usage(800 * MIB);
    ctl.tick_frame();
    assert_eq!(ctl.stats().cleanup_count, 0);

    ctl.update_usage(1300 * MIB);
    ctl.tick_frame();
    let stats = ctl.stats();
    assert_eq!(stats.cleanup_count, 1);
    assert_eq!(stats.emergency_purge_count, 0);
    assert_eq!(cleanups.get(), 1);

    ctl.update_usage(1470 * MIB);
    let stats = ctl.stats();
    assert_eq!(stats.emergency_purge_count, 1);
    assert_eq!(emergencies.get(), 1);
    // The emergency purge always runs a follow-up cleanup pass.
    assert_eq!(stats.cleanup_count, 2);
    assert_eq!(cleanups.get(), 2);
    assert_eq!(stats.total_bytes_freed, 2 * 64 * MIB);
}

#[test]
fn cleanup_gate_blocks_repeat_triggers() {
    let mut config = BudgetConfig::recommended(DeviceTier::Balanced);
    config.cleanup_min_interval_frames = 10;
    let mut ctl = BudgetController::new(config);
    let (cleanups, _) = counting_hooks(&mut ctl, 0);

    // Usage stays above the cleanup threshold every frame; only the unarmed
    // gate (frame 0) and frames 10 and 20 may fire.
    for _ in 0..25 {
        ctl.update_usage(1300 * MIB);
        ctl.tick_frame();
    }
    assert_eq!(cleanups.get(), 3);
}

#[test]
fn emergency_gate_blocks_repeat_triggers() {
    let mut config = BudgetConfig::recommended(DeviceTier::Balanced);
    config.cleanup_min_interval_frames = 1000;
    config.emergency_min_interval_frames = 20;
    let mut ctl = BudgetController::new(config);
    let (_, emergencies) = counting_hooks(&mut ctl, 0);

    for _ in 0..50 {
        ctl.update_usage(1500 * MIB);
        ctl.tick_frame();
    }
    // Frames 0, 20, and 40.
    assert_eq!(emergencies.get(), 3);
}

#[test]
fn manual_variants_ignore_gates_and_switches() {
    let mut config = BudgetConfig::recommended(DeviceTier::Balanced);
    config.enable_auto_cleanup = false;
    config.enable_emergency_purge = false;
    let mut ctl = BudgetController::new(config);
    let (cleanups, emergencies) = counting_hooks(&mut ctl, 1 * MIB);

    ctl.update_usage(1500 * MIB);
    assert_eq!(cleanups.get(), 0);
    assert_eq!(emergencies.get(), 0);

    ctl.request_cleanup();
    ctl.request_cleanup();
    assert_eq!(cleanups.get(), 2);

    ctl.force_emergency_purge();
    assert_eq!(emergencies.get(), 1);
    // Embedded cleanup pass ran too.
    assert_eq!(cleanups.get(), 3);
}

#[test]
fn emergency_without_hooks_still_runs_cleanup() {
    let mut ctl = BudgetController::new(BudgetConfig::recommended(DeviceTier::Balanced));
    let freed = Rc::new(Cell::new(0u64));
    let f = Rc::clone(&freed);
    ctl.register_cleanup_hook(Box::new(move || {
        f.set(f.get() + 1);
        8 * MIB
    }));

    ctl.force_emergency_purge();
    let stats = ctl.stats();
    assert_eq!(stats.emergency_purge_count, 1);
    assert_eq!(stats.cleanup_count, 1);
    assert_eq!(freed.get(), 1);
    assert_eq!(stats.total_bytes_freed, 8 * MIB);
}

#[test]
fn cleanup_hooks_run_in_registration_order() {
    let mut ctl = BudgetController::new(BudgetConfig::recommended(DeviceTier::Balanced));
    let order = Rc::new(std::cell::RefCell::new(Vec::new()));

    for tag in ["first", "second", "third"] {
        let o = Rc::clone(&order);
        ctl.register_cleanup_hook(Box::new(move || {
            o.borrow_mut().push(tag);
            1
        }));
    }

    ctl.request_cleanup();
    assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    assert_eq!(ctl.stats().total_bytes_freed, 3);
}

#[test]
fn emergency_signal_consumed_at_next_tick() {
    let mut ctl = BudgetController::new(BudgetConfig::recommended(DeviceTier::Balanced));
    let fired = Arc::new(AtomicU64::new(0));
    let f = Arc::clone(&fired);
    ctl.register_emergency_hook(Box::new(move || {
        f.fetch_add(1, Ordering::SeqCst);
    }));

    let signal = ctl.emergency_signal();
    let thermal = std::thread::spawn(move || {
        // Thermal loop crosses critical temperature; both requests coalesce.
        signal.request();
        signal.request();
    });
    thermal.join().expect("thermal thread panicked");
    assert!(ctl.emergency_signal().is_pending());

    ctl.tick_frame();
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    // Consumed: no further purge without a new request.
    assert!(!ctl.emergency_signal().is_pending());
    ctl.tick_frame();
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(ctl.stats().emergency_purge_count, 1);
}

#[test]
fn can_allocate_is_a_pure_query() {
    let mut ctl = BudgetController::new(BudgetConfig::recommended(DeviceTier::Balanced));
    ctl.update_usage(1000 * MIB);

    assert!(ctl.can_allocate(536 * MIB));
    assert!(!ctl.can_allocate(537 * MIB));
    // No reservation happened.
    assert_eq!(ctl.current_usage(), 1000 * MIB);
    assert_eq!(ctl.available_bytes(), 536 * MIB);
}

#[test]
fn peak_usage_tracks_high_water_mark() {
    let mut ctl = BudgetController::new(BudgetConfig {
        enable_auto_cleanup: false,
        enable_emergency_purge: false,
        ..BudgetConfig::recommended(DeviceTier::Balanced)
    });

    ctl.update_usage(900 * MIB);
    ctl.update_usage(1400 * MIB);
    ctl.update_usage(300 * MIB);
    assert_eq!(ctl.peak_usage(), 1400 * MIB);
    assert_eq!(ctl.current_usage(), 300 * MIB);
    assert!(!ctl.is_over_limit());

    ctl.update_usage(1600 * MIB);
    assert!(ctl.is_over_limit());
}

#[test]
fn disabled_auto_cleanup_suppresses_gated_passes() {
    let mut config = BudgetConfig::recommended(DeviceTier::Balanced);
    config.enable_auto_cleanup = false;
    config.enable_emergency_purge = false;
    let mut ctl = BudgetController::new(config);
    let (cleanups, emergencies) = counting_hooks(&mut ctl, 0);

    for _ in 0..10 {
        ctl.update_usage(1500 * MIB);
        ctl.tick_frame();
    }
    assert_eq!(cleanups.get(), 0);
    assert_eq!(emergencies.get(), 0);
}

#[test]
fn tier_presets_scale_caps_and_thresholds() {
    let constrained = BudgetConfig::recommended(DeviceTier::Constrained);
    let balanced = BudgetConfig::recommended(DeviceTier::Balanced);
    let ample = BudgetConfig::recommended(DeviceTier::Ample);
    let maximal = BudgetConfig::recommended(DeviceTier::Maximal);

    assert!(constrained.vram_cap_bytes < balanced.vram_cap_bytes);
    assert!(balanced.vram_cap_bytes < ample.vram_cap_bytes);
    assert!(ample.vram_cap_bytes < maximal.vram_cap_bytes);

    // Thresholds loosen as the tier grows.
    assert!(constrained.thresholds.high < balanced.thresholds.high);
    assert!(balanced.thresholds.high < ample.thresholds.high);

    for cfg in [&constrained, &balanced, &ample, &maximal] {
        cfg.validate().expect("preset must validate");
    }
}

#[test]
fn tier_classification_from_ram() {
    assert_eq!(DeviceTier::for_total_ram_mb(2048), DeviceTier::Constrained);
    assert_eq!(DeviceTier::for_total_ram_mb(4096), DeviceTier::Balanced);
    assert_eq!(DeviceTier::for_total_ram_mb(6144), DeviceTier::Ample);
    assert_eq!(DeviceTier::for_total_ram_mb(8192), DeviceTier::Maximal);
}

#[test]
fn stats_snapshot_reflects_state() {
    let mut ctl = BudgetController::new(BudgetConfig {
        enable_auto_cleanup: false,
        enable_emergency_purge: false,
        ..BudgetConfig::recommended(DeviceTier::Balanced)
    });
    ctl.update_usage(768 * MIB);
    for _ in 0..5 {
        ctl.tick_frame();
    }

    let stats = ctl.stats();
    assert_eq!(stats.current_usage_bytes, 768 * MIB);
    assert_eq!(stats.vram_cap_bytes, 1536 * MIB);
    assert!((stats.usage_percentage - 0.5).abs() < 1e-6);
    assert_eq!(stats.pressure, PressureLevel::None);
    assert_eq!(stats.current_frame, 5);

    // Snapshot is serializable for the diagnostics surface.
    let json = serde_json::to_string(&stats).expect("stats serialize");
    assert!(json.contains("\"current_usage_bytes\""));
}

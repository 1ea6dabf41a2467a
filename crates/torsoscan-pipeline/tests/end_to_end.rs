//! Full calibration and measurement run on the synthetic torso.

use torsoscan_math::Vec3;
use torsoscan_mesh::TorsoPhantom;
use torsoscan_pipeline::{
    keys, pipelines, AnalysisParams, HorizontalType, MemorySink, PipelineContext, Scheduler, Tick,
};

fn params() -> AnalysisParams {
    AnalysisParams {
        section_height: 0.02,
        chest_isolation_slice_height: 0.004,
        cutting_cylinder_vertices: 32,
        orientation_half_range: 20,
        ..AnalysisParams::default()
    }
}

fn scheduler(offset: Vec3, sink: &MemorySink) -> Scheduler {
    scheduler_with_yaw(offset, 0.0, sink)
}

fn scheduler_with_yaw(offset: Vec3, yaw_deg: f64, sink: &MemorySink) -> Scheduler {
    let mut torso = TorsoPhantom::default().build();
    torso.rotate_z(yaw_deg.to_radians());
    torso.bake_transform();
    torso.translate(offset);
    let mut s = Scheduler::new(PipelineContext::new(torso, params()).unwrap());
    pipelines::enqueue_calibration(&mut s);
    pipelines::enqueue_measurement(&mut s, Box::new(sink.clone()));
    s
}

#[test]
fn test_offset_torso_is_calibrated_and_measured() {
    let sink = MemorySink::new();
    let mut s = scheduler(Vec3::new(0.03, -0.02, 0.0), &sink);
    s.run_until_idle().unwrap();

    let ctx = s.context();
    let board = ctx.blackboard();
    let center = board.point(keys::BEST_CENTER).unwrap().unwrap();
    assert!((center.y + 0.02).abs() < 1e-3, "center {center:?}");
    // An upright torso needs no turn, or at most a degree of it.
    let yaw = board.number(keys::OBJECT_YAW).unwrap().unwrap_or(0.0);
    assert!(yaw.abs() <= 1.0, "yaw {yaw}");

    let record = sink.last().expect("record emitted");
    assert_eq!(sink.records().len(), 1);
    let left = record.width_left_cm.unwrap();
    let right = record.width_right_cm.unwrap();
    assert!((left - right).abs() <= 0.02 * left.max(right), "{left} vs {right}");
    assert!(record.height_cm.unwrap() > 2.0);
    assert!(record.bust_cm.unwrap() > record.band_cm.unwrap());
    assert_eq!(record.horizontal_type, Some(HorizontalType::Natural));
    assert!(record.vertical_type.is_some());

    let h_left = board.number(keys::ANGLE_H_LEFT).unwrap().unwrap();
    let h_right = board.number(keys::ANGLE_H_RIGHT).unwrap().unwrap();
    assert!((h_left + h_right).abs() < 2.0, "{h_left} vs {h_right}");
}

#[test]
fn test_yawed_torso_is_turned_back() {
    let sink = MemorySink::new();
    let mut s = scheduler_with_yaw(Vec3::zeros(), 8.0, &sink);
    s.run_until_idle().unwrap();

    let yaw = s
        .context()
        .blackboard()
        .number(keys::OBJECT_YAW)
        .unwrap()
        .expect("symmetry plane found");
    assert!((yaw + 8.0).abs() <= 1.0, "yaw {yaw}");

    let record = sink.last().expect("record emitted");
    let left = record.width_left_cm.unwrap();
    let right = record.width_right_cm.unwrap();
    assert!((left - right).abs() <= 0.02 * left.max(right), "{left} vs {right}");
    assert_eq!(record.horizontal_type, Some(HorizontalType::Natural));
}

#[test]
fn test_interrupted_run_leaves_no_record() {
    let sink = MemorySink::new();
    let mut s = scheduler(Vec3::zeros(), &sink);
    s.start().unwrap();
    for _ in 0..50 {
        assert_eq!(s.tick().unwrap(), Tick::Pending);
    }
    s.reset();
    assert_eq!(s.tick().unwrap(), Tick::Idle);
    assert_eq!(s.pending(), 0);
    assert!(sink.records().is_empty());
}

#[test]
fn test_runs_are_deterministic() {
    let (first, second) = (MemorySink::new(), MemorySink::new());
    scheduler(Vec3::zeros(), &first).run_until_idle().unwrap();
    scheduler(Vec3::zeros(), &second).run_until_idle().unwrap();
    let (a, b) = (first.last().unwrap(), second.last().unwrap());
    assert_eq!(a.band_cm, b.band_cm);
    assert_eq!(a.bust_cm, b.bust_cm);
    assert_eq!(a.volume_cm3, b.volume_cm3);
    assert_eq!(a.horizontal_type, b.horizontal_type);
}

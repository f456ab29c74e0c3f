use std::collections::BTreeMap;
use std::sync::Arc;

use ic_controls::*;
use ic_plant::{MissingPolicy, PlantError, TabulatedPlant};

fn c(re: f64) -> Complex64 {
    Complex64::new(re, 0.0)
}

fn close(a: Complex64, b: Complex64) -> bool {
    (a - b).norm() <= 1e-9 * (1.0 + b.norm())
}

fn axis() -> FrequencyAxis {
    FrequencyAxis::new(vec![1.0, 10.0]).unwrap()
}

/// Scalar loop: S = 1, P = 2, A = 1, C = 0.25, so every open loop is 0.5
/// and every closed loop is 2.
fn scalar_loop() -> ControlSystem {
    let plant = TabulatedPlant::new(axis())
        .with_transfer_function("P1", "D1", MotionType::Pos, vec![c(2.0); 2])
        .unwrap()
        .with_quantum_noise("P1", Asd::Flat(1e-3))
        .unwrap();
    let mut cs = ControlSystem::new();
    cs.bind_plant(Arc::new(plant)).unwrap();
    cs.add_dof("X", "P1", "D1", MotionType::Pos).unwrap();
    cs.add_filter("X", "X", Filter::gain(0.25).unwrap());
    cs.tickle().unwrap();
    cs
}

fn scalar(tf: MatrixSeries) -> Vec<Complex64> {
    assert_eq!(tf.shape(), (1, 1));
    tf.entry(0, 0).unwrap().iter().copied().collect()
}

#[test]
fn point_to_point_follows_the_loop() {
    let cs = scalar_loop();
    let tf = |to, from| scalar(cs.get_tf(None, to, None, from).unwrap())[0];

    // same point: the closed loop itself
    assert!(close(tf(SignalKind::Err, SignalKind::Err), c(2.0)));
    // err <- sens: CL · S
    assert!(close(tf(SignalKind::Err, SignalKind::Sens), c(2.0)));
    // err <- drive: CL · S · P
    assert!(close(tf(SignalKind::Err, SignalKind::Drive), c(4.0)));
    // ctrl <- err: CL · C
    assert!(close(tf(SignalKind::Ctrl, SignalKind::Err), c(0.5)));
    // sens <- ctrl: CL · P · M · K · A
    assert!(close(tf(SignalKind::Sens, SignalKind::Ctrl), c(4.0)));
    // drive <- cal: CL · OL · A
    assert!(close(tf(SignalKind::Drive, SignalKind::Cal), c(1.0)));
    // comp <- cal: CL · K · A · C · S · P · A
    assert!(close(tf(SignalKind::Comp, SignalKind::Cal), c(1.0)));
}

#[test]
fn calibration_and_sensing_function() {
    let cs = scalar_loop();
    // CL · S · P · A
    let err = cs.get_calibration("X", "X", InjectionPoint::Err).unwrap();
    assert!(err.iter().all(|v| close(*v, c(4.0))));
    // CL · C · S · P · A
    let ctrl = cs.get_calibration("X", "X", InjectionPoint::Ctrl).unwrap();
    assert!(ctrl.iter().all(|v| close(*v, c(1.0))));
    assert!(matches!(
        cs.get_calibration("X", "X", InjectionPoint::Drive),
        Err(ControlError::UnsupportedPath { .. })
    ));

    let sf = cs.get_sensing_function("X", "X").unwrap();
    assert!(sf.iter().all(|v| close(*v, c(2.0))));
}

#[test]
fn sensing_noise_uses_plant_noise_by_default() {
    let cs = scalar_loop();
    let from_plant = cs
        .get_sensing_noise("X", "P1", None, InjectionPoint::Err)
        .unwrap();
    assert!(from_plant.iter().all(|v| (v - 2e-3).abs() < 1e-15));

    let given = Asd::Spectrum(vec![1.0, 3.0]);
    let noise = cs
        .get_sensing_noise("X", "P1", Some(&given), InjectionPoint::Ctrl)
        .unwrap();
    // |CL · C · S| = 0.5
    assert!((noise[0] - 0.5).abs() < 1e-12);
    assert!((noise[1] - 1.5).abs() < 1e-12);

    assert!(matches!(
        cs.get_sensing_noise("X", "P1", None, InjectionPoint::Sens),
        Err(ControlError::UnsupportedPath { .. })
    ));
    let short = Asd::Spectrum(vec![1.0]);
    assert!(cs
        .get_sensing_noise("X", "P1", Some(&short), InjectionPoint::Err)
        .is_err());
}

#[test]
fn uncorrelated_noises_add_in_quadrature() {
    let plant = TabulatedPlant::new(axis()).with_missing_policy(MissingPolicy::Zero);
    let mut cs = ControlSystem::new();
    cs.bind_plant(Arc::new(plant)).unwrap();
    cs.add_dof("X", [("P1", 1.0), ("P2", 1.0)], "D1", MotionType::Pos)
        .unwrap();
    cs.tickle().unwrap();

    let mut asds = BTreeMap::new();
    asds.insert("P1".to_string(), Asd::Flat(3.0));
    asds.insert("P2".to_string(), Asd::Flat(4.0));
    let total = cs
        .get_total_noise_to("X", SignalKind::Err, SignalKind::Sens, &asds)
        .unwrap();
    assert!(total.iter().all(|v| (v - 5.0).abs() < 1e-12));

    let mut spread = BTreeMap::new();
    spread.insert("X".to_string(), Asd::Flat(2.0));
    let from = cs
        .get_total_noise_from(SignalKind::Err, "P2", SignalKind::Sens, &spread)
        .unwrap();
    assert!(from.iter().all(|v| (v - 2.0).abs() < 1e-12));

    asds.insert("P9".to_string(), Asd::Flat(1.0));
    assert!(matches!(
        cs.get_total_noise_to("X", SignalKind::Err, SignalKind::Sens, &asds),
        Err(ControlError::NotFound { what: "probe", .. })
    ));
}

#[test]
fn names_slice_the_right_axis() {
    let plant = TabulatedPlant::new(axis()).with_missing_policy(MissingPolicy::Zero);
    let mut cs = ControlSystem::new();
    cs.bind_plant(Arc::new(plant)).unwrap();
    cs.add_dof("A", [("P1", 1.0), ("P2", 1.0), ("P3", 1.0)], "D1", MotionType::Pos)
        .unwrap();
    cs.add_dof("B", "P1", "D2", MotionType::Pos).unwrap();
    cs.tickle().unwrap();

    let full = cs
        .get_tf(None, SignalKind::Err, None, SignalKind::Sens)
        .unwrap();
    assert_eq!(full.shape(), (2, 3));
    let row = cs
        .get_tf(Some("B"), SignalKind::Err, None, SignalKind::Sens)
        .unwrap();
    assert_eq!(row.shape(), (1, 3));
    let col = cs
        .get_tf(None, SignalKind::Comp, Some("P3"), SignalKind::Sens)
        .unwrap();
    assert_eq!(col.shape(), (2, 1));

    // a probe name is not a DOF
    assert!(matches!(
        cs.get_tf(Some("P1"), SignalKind::Err, None, SignalKind::Sens),
        Err(ControlError::NotFound { what: "dof", .. })
    ));
    assert!(matches!(
        cs.get_tf(Some("D1"), SignalKind::Drive, None, SignalKind::Err),
        Err(ControlError::NotFound { what: "drive", .. })
    ));
    assert!(cs
        .get_tf(Some("D1.pos"), SignalKind::Drive, None, SignalKind::Err)
        .is_ok());
}

#[test]
fn unsupported_paths_are_rejected() {
    let cs = scalar_loop();
    for (to, from) in [
        (SignalKind::Cal, SignalKind::Err),
        (SignalKind::Err, SignalKind::Pos),
        (SignalKind::Pos, SignalKind::Spot),
    ] {
        assert_eq!(
            cs.get_tf(None, to, None, from).unwrap_err(),
            ControlError::UnsupportedPath { to, from }
        );
    }
}

#[test]
fn position_includes_mechanical_modification() {
    let plant = TabulatedPlant::new(axis())
        .with_missing_policy(MissingPolicy::Zero)
        .with_mechanical_modification("EX", "EX", MotionType::Pos, vec![c(1.5); 2])
        .unwrap()
        .with_mechanical_modification("EX", "EY", MotionType::Pos, vec![c(0.1); 2])
        .unwrap()
        .with_mechanical_modification("EY", "EX", MotionType::Pos, vec![c(0.2); 2])
        .unwrap()
        .with_mechanical_modification("EY", "EY", MotionType::Pos, vec![c(0.5); 2])
        .unwrap();
    let mut cs = ControlSystem::new();
    cs.bind_plant(Arc::new(plant)).unwrap();
    cs.add_dof("DARM", "AS", [("EX", 1.0), ("EY", -1.0)], MotionType::Pos)
        .unwrap();
    cs.tickle().unwrap();

    // open loop, so pos <- drive is the modification itself
    let pos = cs
        .get_tf(Some("EY.pos"), SignalKind::Pos, Some("EX.pos"), SignalKind::Drive)
        .unwrap();
    assert!(scalar(pos).iter().all(|v| close(*v, c(0.2))));

    // with no loop gain the drives never see the calibration line
    let cal = cs
        .get_tf(Some("EX.pos"), SignalKind::Pos, Some("DARM"), SignalKind::Cal)
        .unwrap();
    assert!(scalar(cal).iter().all(|v| close(*v, c(0.0))));
}

#[test]
fn position_from_calibration_passes_the_loop_once() {
    // P = [1, -1], A = [1, -1]^T, C = 0.25: P·A = 2 so the DOF loop gain
    // is 0.5, and CL · OL · A at the drives reduces to A.
    let plant = TabulatedPlant::new(axis())
        .with_transfer_function("AS", "EX", MotionType::Pos, vec![c(1.0); 2])
        .unwrap()
        .with_transfer_function("AS", "EY", MotionType::Pos, vec![c(-1.0); 2])
        .unwrap()
        .with_mechanical_modification("EX", "EX", MotionType::Pos, vec![c(1.5); 2])
        .unwrap()
        .with_mechanical_modification("EX", "EY", MotionType::Pos, vec![c(0.1); 2])
        .unwrap()
        .with_mechanical_modification("EY", "EX", MotionType::Pos, vec![c(0.2); 2])
        .unwrap()
        .with_mechanical_modification("EY", "EY", MotionType::Pos, vec![c(0.5); 2])
        .unwrap();
    let mut cs = ControlSystem::new();
    cs.bind_plant(Arc::new(plant)).unwrap();
    cs.add_dof("DARM", "AS", [("EX", 1.0), ("EY", -1.0)], MotionType::Pos)
        .unwrap();
    cs.add_filter("DARM", "DARM", Filter::gain(0.25).unwrap());
    cs.tickle().unwrap();

    let drives = cs
        .get_tf(None, SignalKind::Drive, Some("DARM"), SignalKind::Cal)
        .unwrap();
    let ex = drives.entry(0, 0).unwrap();
    let ey = drives.entry(1, 0).unwrap();
    assert!(ex.iter().all(|v| close(*v, c(1.0))));
    assert!(ey.iter().all(|v| close(*v, c(-1.0))));

    let cal = cs
        .get_tf(Some("EX.pos"), SignalKind::Pos, Some("DARM"), SignalKind::Cal)
        .unwrap();
    assert!(scalar(cal).iter().all(|v| close(*v, c(1.5 - 0.1))));
}

#[test]
fn position_rejects_mixed_motion_types() {
    let plant = TabulatedPlant::new(axis()).with_missing_policy(MissingPolicy::Zero);
    let mut cs = ControlSystem::new();
    cs.bind_plant(Arc::new(plant)).unwrap();
    cs.add_dof("L", "P1", "EX", MotionType::Pos).unwrap();
    cs.add_dof("PIT", "P2", "EX", MotionType::Pitch).unwrap();
    cs.tickle().unwrap();

    let err = cs
        .get_tf(None, SignalKind::Pos, None, SignalKind::Drive)
        .unwrap_err();
    assert_eq!(
        err,
        ControlError::MotionMismatch {
            drive_to: "EX.pos".to_string(),
            drive_from: "EX.pitch".to_string(),
            to: MotionType::Pos,
            from: MotionType::Pitch,
        }
    );
}

#[test]
fn spot_motion_uses_configured_face() {
    let plant = TabulatedPlant::new(axis())
        .with_missing_policy(MissingPolicy::Zero)
        .with_beam_spot_motion("IX", "bk", "IX", MotionType::Pitch, vec![c(3.0); 2])
        .unwrap();
    let plant: SharedPlant = Arc::new(plant);

    let mut front = ControlSystem::new();
    front.bind_plant(plant.clone()).unwrap();
    front.add_dof("PIT", "WFS", "IX", MotionType::Pitch).unwrap();
    front.tickle().unwrap();
    assert!(matches!(
        front.get_tf(None, SignalKind::Spot, None, SignalKind::Drive),
        Err(ControlError::Plant(PlantError::MissingBeamSpotMotion { .. }))
    ));

    let mut back = ControlSystem::new().with_spot_face("bk");
    back.bind_plant(plant).unwrap();
    back.add_dof("PIT", "WFS", "IX", MotionType::Pitch).unwrap();
    back.tickle().unwrap();
    let spot = back
        .get_tf(None, SignalKind::Spot, None, SignalKind::Drive)
        .unwrap();
    assert!(scalar(spot).iter().all(|v| close(*v, c(3.0))));
}

/// Two DOFs on two probes and two drives, every matrix non-symmetric and
/// the plant complex, so any reordered factor changes the result.
fn mimo_loop() -> ControlSystem {
    let plant = TabulatedPlant::new(axis())
        .with_transfer_function("P1", "D1", MotionType::Pos, vec![Complex64::new(0.9, 0.1); 2])
        .unwrap()
        .with_transfer_function("P1", "D2", MotionType::Pos, vec![Complex64::new(0.2, -0.3); 2])
        .unwrap()
        .with_transfer_function("P2", "D1", MotionType::Pos, vec![Complex64::new(-0.4, 0.05); 2])
        .unwrap()
        .with_transfer_function("P2", "D2", MotionType::Pos, vec![Complex64::new(1.3, 0.2); 2])
        .unwrap();
    let mut cs = ControlSystem::new();
    cs.bind_plant(Arc::new(plant)).unwrap();
    cs.add_dof("A", [("P1", 1.0), ("P2", 0.5)], [("D1", 1.0), ("D2", 0.4)], MotionType::Pos)
        .unwrap();
    cs.add_dof("B", [("P1", -0.3), ("P2", 1.0)], [("D1", -0.7), ("D2", 1.0)], MotionType::Pos)
        .unwrap();
    cs.add_filter("A", "A", Filter::gain(0.3).unwrap());
    cs.add_filter("A", "B", Filter::gain(0.15).unwrap());
    cs.add_filter("B", "A", Filter::gain(-0.1).unwrap());
    cs.add_filter("B", "B", Filter::gain(0.2).unwrap());
    cs.add_compensator("D1", MotionType::Pos, Filter::gain(1.5).unwrap()).unwrap();
    cs.add_compensator("D2", MotionType::Pos, Filter::gain(0.6).unwrap()).unwrap();
    cs.set_response("D1", MotionType::Pos, Filter::gain(0.8).unwrap()).unwrap();
    cs.set_response("D2", MotionType::Pos, Filter::gain(1.2).unwrap()).unwrap();
    cs.tickle().unwrap();
    cs
}

#[test]
fn mimo_paths_keep_operand_order() {
    use nalgebra::{DMatrix, DVector};

    let cs = mimo_loop();
    let s = DMatrix::from_row_slice(2, 2, &[c(1.0), c(0.5), c(-0.3), c(1.0)]);
    let a = DMatrix::from_row_slice(2, 2, &[c(1.0), c(-0.7), c(0.4), c(1.0)]);
    let p = DMatrix::from_row_slice(
        2,
        2,
        &[
            Complex64::new(0.9, 0.1),
            Complex64::new(0.2, -0.3),
            Complex64::new(-0.4, 0.05),
            Complex64::new(1.3, 0.2),
        ],
    );
    let ctl = DMatrix::from_row_slice(2, 2, &[c(0.3), c(0.15), c(-0.1), c(0.2)]);
    let k = DMatrix::from_diagonal(&DVector::from_vec(vec![c(1.5), c(0.6)]));
    let m = DMatrix::from_diagonal(&DVector::from_vec(vec![c(0.8), c(1.2)]));

    let id = DMatrix::<Complex64>::identity(2, 2);
    let closed = |ol: DMatrix<Complex64>| (&id - ol).try_inverse().unwrap();
    let ol_drive = &m * &k * &a * &ctl * &s * &p;
    let cl_err = closed(&s * &p * &m * &k * &a * &ctl);
    let cl_ctrl = closed(&ctl * &s * &p * &m * &k * &a);
    let cl_comp = closed(&k * &a * &ctl * &s * &p * &m);
    let cl_drive = closed(ol_drive.clone());
    let cl_sens = closed(&p * &m * &k * &a * &ctl * &s);

    let cases = [
        (SignalKind::Ctrl, SignalKind::Sens, &cl_ctrl * &ctl * &s),
        (SignalKind::Comp, SignalKind::Err, &cl_comp * &k * &a * &ctl),
        (SignalKind::Sens, SignalKind::Ctrl, &cl_sens * &p * &m * &k * &a),
        (SignalKind::Err, SignalKind::Comp, &cl_err * &s * &p * &m),
        (SignalKind::Err, SignalKind::Cal, &cl_err * &s * &p * &a),
        (SignalKind::Drive, SignalKind::Sens, &cl_drive * &m * &k * &a * &ctl * &s),
        (SignalKind::Drive, SignalKind::Cal, &cl_drive * &ol_drive * &a),
    ];
    for (to, from, want) in cases {
        let tf = cs.get_tf(None, to, None, from).unwrap();
        for bin in tf.bins() {
            let diff = (bin - &want).norm();
            assert!(diff < 1e-12, "{to} <- {from}: off by {diff}");
        }
    }
}

mod common;

use combustion_sweep::chemistry::FuelSpec;
use combustion_sweep::compensation::OutlierReason;
use combustion_sweep::error::SweepError;
use combustion_sweep::ignition::{DetectionMethod, IgnitionParams};
use combustion_sweep::sweep::{
    NoProgress, ProgressSink, SweepDriver, SweepParams, SweepProgress, SweepRequest,
};
use combustion_sweep::types::{GridAxis, Metric};
use common::mock_chemistry::{MockChemistry, PointScript, DT};

const T_AXIS: [f64; 3] = [900.0, 1000.0, 1100.0];
const P_AXIS: [f64; 3] = [5.0, 10.0, 15.0];

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn mock_params(has_carbon: bool) -> SweepParams {
    SweepParams {
        fuel: FuelSpec::new("Mock", "mock.yaml", "H2:1.0", has_carbon),
        ignition: IgnitionParams {
            end_time_s: 0.01,
            ..IgnitionParams::default()
        },
        ..SweepParams::default()
    }
}

fn axes() -> (GridAxis, GridAxis) {
    (GridAxis::new(T_AXIS.to_vec()), GridAxis::new(P_AXIS.to_vec()))
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * b.abs().max(1.0)
}

/// Expected delay for the mock reactor (ignition centred on step 40), in μs.
fn expected_delay_us() -> f64 {
    40.0 * DT * 1e6
}

#[derive(Default)]
struct RecordingSink {
    reports: Vec<SweepProgress>,
    cancel_after: Option<usize>,
}

impl ProgressSink for RecordingSink {
    fn report(&mut self, progress: &SweepProgress) {
        self.reports.push(progress.clone());
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_after
            .is_some_and(|limit| self.reports.len() >= limit)
    }
}

#[test]
fn grids_match_axis_shape() {
    init_logging();
    let engine = MockChemistry::healthy();
    let t_axis = GridAxis::new(vec![900.0, 1000.0, 1100.0, 1200.0]);
    let p_axis = GridAxis::new(vec![5.0, 10.0]);

    let result = SweepDriver::new(mock_params(false))
        .run(&engine, &t_axis, &p_axis, 1.0, NoProgress)
        .expect("sweep completes");
    assert_eq!(result.shape(), (2, 4));
    assert_eq!(
        result.metrics().collect::<Vec<_>>(),
        Metric::sweep_order(false).to_vec()
    );
    for grid in result.grids.values().chain(result.raw_grids.values()) {
        assert_eq!(grid.shape(), (2, 4));
    }
}

#[test]
fn carbon_fuels_also_report_co_and_co2() {
    let engine = MockChemistry::healthy();
    let (t_axis, p_axis) = axes();
    let result = SweepDriver::new(mock_params(true))
        .run(&engine, &t_axis, &p_axis, 1.0, NoProgress)
        .expect("sweep completes");
    assert_eq!(result.grids.len(), 6);
    let co2 = result.grid(Metric::Co2).expect("CO2 grid");
    assert!(approx(co2.get(1, 1), 100_000.0));

    let hydrogen = SweepDriver::new(mock_params(false))
        .run(&engine, &t_axis, &p_axis, 1.0, NoProgress)
        .expect("sweep completes");
    assert!(hydrogen.grid(Metric::Co).is_none());
    assert!(hydrogen.grid(Metric::Co2).is_none());
}

#[test]
fn healthy_sweep_needs_no_compensation() {
    init_logging();
    let engine = MockChemistry::healthy();
    let (t_axis, p_axis) = axes();
    let mut sink = RecordingSink::default();

    let result = SweepDriver::new(mock_params(false))
        .run(&engine, &t_axis, &p_axis, 1.0, &mut sink)
        .expect("sweep completes");

    assert!(result.records.is_empty());
    assert_eq!(result.failed_points, 0);
    assert_eq!(result.degraded_points, 0);
    let t_ad = result.grid(Metric::AdiabaticTemperature).expect("T_ad");
    let delay = result.grid(Metric::IgnitionDelay).expect("delay");
    let nox = result.grid(Metric::Nox).expect("NOx");
    for (row, _) in P_AXIS.iter().enumerate() {
        for (col, &t) in T_AXIS.iter().enumerate() {
            assert!(approx(t_ad.get(row, col), t + 1500.0));
            assert!(approx(delay.get(row, col), expected_delay_us()));
            assert!(approx(nox.get(row, col), 110.0));
        }
    }

    assert_eq!(sink.reports.len(), 9);
    let last = sink.reports.last().expect("progress reported");
    assert_eq!((last.completed, last.total), (9, 9));
    assert_eq!(last.remaining_s, 0.0);
    // Row-major: pressure rows, temperature columns.
    assert_eq!(
        (sink.reports[1].temperature, sink.reports[1].pressure),
        (1000.0, 5.0)
    );
    assert_eq!(
        (sink.reports[3].temperature, sink.reports[3].pressure),
        (900.0, 10.0)
    );
}

#[test]
fn flame_failure_is_isolated_and_compensated() {
    init_logging();
    let engine = MockChemistry::scripted(|t, p| {
        let mut script = PointScript::healthy(t);
        if t == 1000.0 && p == 10.0 {
            script.flame = Err("did not converge".into());
        }
        script
    });
    let (t_axis, p_axis) = axes();
    let result = SweepDriver::new(mock_params(false))
        .run(&engine, &t_axis, &p_axis, 1.0, NoProgress)
        .expect("sweep completes");

    let raw_flame = &result.raw_grids[&Metric::FlameSpeed];
    assert_eq!(raw_flame.get(1, 1), 0.0);
    assert!(approx(result.raw_grids[&Metric::AdiabaticTemperature].get(1, 1), 2500.0));
    assert!(approx(
        result.raw_grids[&Metric::IgnitionDelay].get(1, 1),
        expected_delay_us()
    ));
    assert_eq!(result.degraded_points, 1);
    assert_eq!(result.failed_points, 0);

    // The isolated zero is repaired from its eight neighbours.
    assert_eq!(result.records.len(), 1);
    let record = &result.records[0];
    assert_eq!(record.metric, Metric::FlameSpeed);
    assert_eq!(record.reason, OutlierReason::IsolatedZero);
    assert_eq!((record.temperature, record.pressure), (1000.0, 10.0));
    assert!(approx(record.replacement, 1.5));
    assert!(approx(result.grid(Metric::FlameSpeed).unwrap().get(1, 1), 1.5));
}

#[test]
fn non_positive_flame_speed_is_reported_as_zero() {
    let engine = MockChemistry::scripted(|t, _p| {
        let mut script = PointScript::healthy(t);
        script.flame = Ok(-0.2);
        script
    });
    let (t_axis, p_axis) = axes();
    let result = SweepDriver::new(mock_params(false))
        .run(&engine, &t_axis, &p_axis, 1.0, NoProgress)
        .expect("sweep completes");
    let flame = result.grid(Metric::FlameSpeed).unwrap();
    assert!(flame.matrix().iter().all(|&v| v == 0.0));
    assert!(result.records_for(Metric::FlameSpeed).next().is_none());
}

#[test]
fn equilibrium_failure_zeroes_only_equilibrium_metrics() {
    let engine = MockChemistry::scripted(|t, p| {
        let mut script = PointScript::healthy(t);
        script.equilibrium_fails = t == 900.0 && p == 5.0;
        script
    });
    let (t_axis, p_axis) = axes();
    let result = SweepDriver::new(mock_params(true))
        .run(&engine, &t_axis, &p_axis, 1.0, NoProgress)
        .expect("sweep completes");
    for metric in [Metric::AdiabaticTemperature, Metric::Nox, Metric::Co, Metric::Co2] {
        assert_eq!(result.raw_grids[&metric].get(0, 0), 0.0, "{metric}");
    }
    assert!(approx(
        result.raw_grids[&Metric::IgnitionDelay].get(0, 0),
        expected_delay_us()
    ));
    assert!(approx(result.raw_grids[&Metric::FlameSpeed].get(0, 0), 0.5));
    // Zero is a legitimate value for non-rate metrics.
    assert_eq!(result.grid(Metric::AdiabaticTemperature).unwrap().get(0, 0), 0.0);
}

#[test]
fn composition_is_retried_once() {
    let engine = MockChemistry::scripted(|t, _p| PointScript {
        composition_failures: 1,
        ..PointScript::healthy(t)
    });
    let (t_axis, p_axis) = axes();
    let result = SweepDriver::new(mock_params(false))
        .run(&engine, &t_axis, &p_axis, 1.0, NoProgress)
        .expect("sweep completes");
    assert_eq!(engine.composition_calls(), 18);
    assert_eq!(result.failed_points, 0);
    assert!(result.records.is_empty());
}

#[test]
fn persistent_composition_failure_degrades_the_point() {
    init_logging();
    let engine = MockChemistry::scripted(|t, p| PointScript {
        composition_failures: if t == 1100.0 && p == 15.0 { usize::MAX } else { 0 },
        ..PointScript::healthy(t)
    });
    let (t_axis, p_axis) = axes();
    let result = SweepDriver::new(mock_params(false))
        .run(&engine, &t_axis, &p_axis, 1.0, NoProgress)
        .expect("sweep completes");

    assert_eq!(engine.composition_calls(), 10);
    assert_eq!(result.failed_points, 1);
    for metric in Metric::sweep_order(false) {
        assert_eq!(result.raw_grids[metric].get(2, 2), 0.0, "{metric}");
    }
    // Corner zero with ignited neighbours is repaired; T_ad zero is kept.
    let delay = result.grid(Metric::IgnitionDelay).unwrap();
    assert!(approx(delay.get(2, 2), 3.0 * expected_delay_us()));
    assert_eq!(result.grid(Metric::AdiabaticTemperature).unwrap().get(2, 2), 0.0);
}

#[test]
fn collaborator_panic_degrades_the_point() {
    let engine = MockChemistry::scripted(|t, p| PointScript {
        panic: t == 900.0 && p == 10.0,
        ..PointScript::healthy(t)
    });
    let (t_axis, p_axis) = axes();
    let result = SweepDriver::new(mock_params(false))
        .run(&engine, &t_axis, &p_axis, 1.0, NoProgress)
        .expect("sweep completes");
    assert_eq!(result.failed_points, 1);
    assert_eq!(result.raw_grids[&Metric::AdiabaticTemperature].get(1, 0), 0.0);
    assert!(approx(
        result.raw_grids[&Metric::AdiabaticTemperature].get(1, 1),
        2500.0
    ));
}

#[test]
fn flame_panic_keeps_equilibrium_and_delay() {
    init_logging();
    let engine = MockChemistry::scripted(|t, p| PointScript {
        flame_panics: t == 1000.0 && p == 10.0,
        ..PointScript::healthy(t)
    });
    let (t_axis, p_axis) = axes();
    let result = SweepDriver::new(mock_params(false))
        .run(&engine, &t_axis, &p_axis, 1.0, NoProgress)
        .expect("sweep completes");

    assert_eq!(result.failed_points, 0);
    assert_eq!(result.degraded_points, 1);
    assert!(approx(result.raw_grids[&Metric::AdiabaticTemperature].get(1, 1), 2500.0));
    assert!(approx(
        result.raw_grids[&Metric::IgnitionDelay].get(1, 1),
        expected_delay_us()
    ));
    assert_eq!(result.raw_grids[&Metric::FlameSpeed].get(1, 1), 0.0);
    assert!(approx(result.grid(Metric::FlameSpeed).unwrap().get(1, 1), 1.5));
}

#[test]
fn equilibrium_panic_keeps_ignition_and_flame() {
    let engine = MockChemistry::scripted(|t, p| PointScript {
        equilibrium_panics: t == 900.0 && p == 5.0,
        ..PointScript::healthy(t)
    });
    let (t_axis, p_axis) = axes();
    let result = SweepDriver::new(mock_params(false))
        .run(&engine, &t_axis, &p_axis, 1.0, NoProgress)
        .expect("sweep completes");

    assert_eq!(result.failed_points, 0);
    assert_eq!(result.raw_grids[&Metric::AdiabaticTemperature].get(0, 0), 0.0);
    assert_eq!(result.raw_grids[&Metric::Nox].get(0, 0), 0.0);
    assert!(approx(
        result.raw_grids[&Metric::IgnitionDelay].get(0, 0),
        expected_delay_us()
    ));
    assert!(approx(result.raw_grids[&Metric::FlameSpeed].get(0, 0), 0.5));
}

#[test]
fn step_failure_truncates_the_trace() {
    // Fails after ignition: the collected samples still locate it.
    let late = MockChemistry::scripted(|t, _p| PointScript {
        step_fail_after: Some(60),
        ..PointScript::healthy(t)
    });
    let (t_axis, p_axis) = axes();
    let result = SweepDriver::new(mock_params(false))
        .run(&late, &t_axis, &p_axis, 1.0, NoProgress)
        .expect("sweep completes");
    let delay = result.grid(Metric::IgnitionDelay).unwrap();
    assert!(delay.matrix().iter().all(|&v| approx(v, expected_delay_us())));
    assert_eq!(result.degraded_points, 9);

    // Fails before ignition: no rise, no delay, nothing to repair.
    let early = MockChemistry::scripted(|t, _p| PointScript {
        step_fail_after: Some(20),
        ..PointScript::healthy(t)
    });
    let result = SweepDriver::new(mock_params(false))
        .run(&early, &t_axis, &p_axis, 1.0, NoProgress)
        .expect("sweep completes");
    let delay = result.grid(Metric::IgnitionDelay).unwrap();
    assert!(delay.matrix().iter().all(|&v| v == 0.0));
    assert!(result.records_for(Metric::IgnitionDelay).next().is_none());
}

#[test]
fn reactor_setup_failure_gives_zero_delay() {
    let engine = MockChemistry::scripted(|t, _p| PointScript {
        reactor_fails: true,
        ..PointScript::healthy(t)
    });
    let (t_axis, p_axis) = axes();
    let result = SweepDriver::new(mock_params(false))
        .run(&engine, &t_axis, &p_axis, 1.0, NoProgress)
        .expect("sweep completes");
    assert!(result.raw_grids[&Metric::IgnitionDelay]
        .matrix()
        .iter()
        .all(|&v| v == 0.0));
    assert!(approx(result.raw_grids[&Metric::FlameSpeed].get(0, 0), 0.5));
}

#[test]
fn missing_species_falls_back_for_the_whole_sweep() {
    init_logging();
    let engine = MockChemistry::healthy().without_species("OH");
    let mut params = mock_params(false);
    params.ignition.method = DetectionMethod::MaxSpeciesGradient;
    let (t_axis, p_axis) = axes();

    let result = SweepDriver::new(params.clone())
        .run(&engine, &t_axis, &p_axis, 1.0, NoProgress)
        .expect("sweep completes");
    assert!(result.detection_fallback);
    assert_eq!(result.final_method, DetectionMethod::MaxTemperatureGradient);
    let delay = result.grid(Metric::IgnitionDelay).unwrap();
    assert!(delay.matrix().iter().all(|&v| approx(v, expected_delay_us())));

    // A new sweep starts from the requested method again.
    let with_oh = MockChemistry::healthy();
    let result = SweepDriver::new(params)
        .run(&with_oh, &t_axis, &p_axis, 1.0, NoProgress)
        .expect("sweep completes");
    assert!(!result.detection_fallback);
    assert_eq!(result.final_method, DetectionMethod::MaxSpeciesGradient);
    let delay = result.grid(Metric::IgnitionDelay).unwrap();
    assert!(delay.matrix().iter().all(|&v| approx(v, expected_delay_us())));
}

#[test]
fn cancellation_stops_between_points() {
    let engine = MockChemistry::healthy();
    let (t_axis, p_axis) = axes();
    let mut sink = RecordingSink {
        cancel_after: Some(4),
        ..RecordingSink::default()
    };
    let err = SweepDriver::new(mock_params(false))
        .run(&engine, &t_axis, &p_axis, 1.0, &mut sink)
        .expect_err("sweep is cancelled");
    assert_eq!(
        err,
        SweepError::Cancelled {
            completed: 4,
            total: 9
        }
    );
    assert_eq!(sink.reports.len(), 4);
}

#[test]
fn empty_axes_are_rejected() {
    let engine = MockChemistry::healthy();
    let driver = SweepDriver::new(mock_params(false));
    let err = driver
        .run(
            &engine,
            &GridAxis::new(Vec::new()),
            &GridAxis::new(vec![1.0]),
            1.0,
            NoProgress,
        )
        .expect_err("empty axis");
    assert_eq!(err, SweepError::EmptyAxis("temperature"));

    let request = SweepRequest {
        grid_size: 0,
        ..SweepRequest::default()
    };
    assert!(matches!(
        driver.run_centered(&engine, &request, NoProgress),
        Err(SweepError::InvalidRequest(_))
    ));
}

#[test]
fn centred_sweep_rejects_out_of_range_request() {
    let engine = MockChemistry::healthy();
    let request = SweepRequest {
        temperature: 1700.0,
        pressure: 60.0,
        phi: 1.0,
        grid_size: 3,
    };
    let err = SweepDriver::new(mock_params(false))
        .run_centered(&engine, &request, NoProgress)
        .expect_err("temperature above range");
    assert!(matches!(err, SweepError::InvalidRequest(ref msg) if msg.contains("temperature")));
    assert_eq!(engine.composition_calls(), 0);
}

#[test]
fn centred_sweep_builds_axes_from_request() {
    let engine = MockChemistry::healthy();
    let request = SweepRequest {
        temperature: 1000.0,
        pressure: 2.0,
        phi: 0.8,
        grid_size: 3,
    };
    let result = SweepDriver::new(mock_params(false))
        .run_centered(&engine, &request, NoProgress)
        .expect("sweep completes");
    assert_eq!(result.temperature_axis.values(), &[900.0, 1000.0, 1100.0]);
    assert_eq!(result.pressure_axis.values(), &[0.5, 3.75, 7.0]);
    assert_eq!(result.phi, 0.8);
    assert!(result.timings.stage_ms("evaluation").is_some());
    assert!(result.timings.stage_ms("compensate.flame_speed").is_some());
}

#[cfg(feature = "parallel")]
#[test]
fn parallel_sweep_matches_sequential() {
    let engine = MockChemistry::scripted(|t, p| {
        let mut script = PointScript::healthy(t);
        if t == 1000.0 && p == 10.0 {
            script.flame = Err("did not converge".into());
        }
        script
    });
    let (t_axis, p_axis) = axes();
    let driver = SweepDriver::new(mock_params(true));
    let sequential = driver
        .run(&engine, &t_axis, &p_axis, 1.0, NoProgress)
        .expect("sequential");
    let mut sink = RecordingSink::default();
    let parallel = driver
        .run_parallel(&engine, &t_axis, &p_axis, 1.0, &mut sink)
        .expect("parallel");
    assert_eq!(sequential.grids, parallel.grids);
    assert_eq!(sequential.records, parallel.records);
    assert_eq!(sink.reports.len(), 9);
}

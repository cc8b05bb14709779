use event_shapes::config::GeneratorConfig;
use event_shapes::generator::{Topology, ToyEventGenerator};
use event_shapes::kinematics::momentum::Momentum;
use event_shapes::kinematics::vector::{cross, dot, norm};
use event_shapes::thrust::{AcceleratedThrust, BaselineThrust, ShapeResult};

const EPS: f64 = 1e-9;

fn corpus(seed: u64, events: usize) -> Vec<Vec<Momentum>> {
    let config = GeneratorConfig {
        seed,
        ..GeneratorConfig::default()
    };
    ToyEventGenerator::new(&config)
        .expect("generator")
        .take(events)
        .map(|event| event.momenta())
        .collect()
}

fn assert_well_formed(result: &ShapeResult) {
    assert!((0.5 - EPS..=1.0).contains(&result.thrust), "thrust {}", result.thrust);
    assert!(result.major <= result.thrust + EPS);
    assert!(result.minor <= result.major + EPS);
    assert!(result.minor >= 0.0);
    assert!(result.oblateness >= 0.0);
    assert!((result.oblateness - (result.major - result.minor)).abs() < EPS);
    for axis in &result.axes {
        assert!((norm(axis) - 1.0).abs() < EPS);
    }
    let [n1, n2, n3] = result.axes;
    assert!(dot(&n1, &n2).abs() < EPS);
    assert!(dot(&n1, &n3).abs() < EPS);
    assert!(dot(&n2, &n3).abs() < EPS);
    let handed = cross(&n1, &n2);
    for i in 0..3 {
        assert!((handed[i] - n3[i]).abs() < EPS);
    }
}

#[test]
fn generated_corpus_is_well_formed_for_both_variants() {
    let mut baseline = BaselineThrust::default();
    let mut accelerated = AcceleratedThrust::default();
    for (index, event) in corpus(11, 500).iter().enumerate() {
        let b = baseline.analyze(event).unwrap_or_else(|e| panic!("event {index}: {e}"));
        let a = accelerated.analyze(event).unwrap_or_else(|e| panic!("event {index}: {e}"));
        assert_well_formed(&b);
        assert_well_formed(&a);
        assert_eq!(b.diagnostics.clamped, 0, "event {index}");
        assert_eq!(a.diagnostics.clamped, 0, "event {index}");
        assert_eq!(baseline.particle_count(), event.len());
        assert_eq!(accelerated.particle_count(), event.len());
    }
}

#[test]
fn accelerated_agrees_with_baseline_and_never_exceeds_it() {
    let mut baseline = BaselineThrust::default();
    let mut accelerated = AcceleratedThrust::default();
    for (index, event) in corpus(20_181_001, 2000).iter().enumerate() {
        let b = baseline.analyze(event).expect("baseline");
        let a = accelerated.analyze(event).expect("accelerated");
        assert!(
            (a.thrust - b.thrust).abs() <= 1e-6,
            "event {index}: baseline {} accelerated {}",
            b.thrust,
            a.thrust
        );
        assert!(a.thrust <= b.thrust, "event {index}");
    }
}

#[test]
fn repeated_analysis_is_bit_identical() {
    let events = corpus(5, 200);
    let run = || {
        let mut analyzer = AcceleratedThrust::default();
        events
            .iter()
            .map(|event| analyzer.analyze(event).expect("analysis"))
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());

    // A fresh analyzer and one that saw a larger event first agree bit for bit.
    let mut warmed = BaselineThrust::default();
    let largest = events.iter().max_by_key(|e| e.len()).expect("events");
    warmed.analyze(largest).expect("analysis");
    let mut fresh = BaselineThrust::default();
    for event in &events {
        assert_eq!(warmed.analyze(event), fresh.analyze(event));
    }
}

#[test]
fn generator_is_reproducible_and_mixes_topologies() {
    let config = GeneratorConfig::default();
    let first: Vec<_> = ToyEventGenerator::new(&config).expect("generator").take(300).collect();
    let second: Vec<_> = ToyEventGenerator::new(&config).expect("generator").take(300).collect();
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.momenta(), b.momenta());
    }
    let three_jet = first
        .iter()
        .filter(|e| matches!(e.topology, Topology::ThreeJet))
        .count();
    assert!(three_jet > 10 && three_jet < 150, "three-jet events: {three_jet}");
}

#[test]
fn dijet_events_have_high_thrust_and_small_oblateness() {
    let config = GeneratorConfig {
        three_jet_fraction: 0.0,
        ..GeneratorConfig::default()
    };
    let mut analyzer = AcceleratedThrust::default();
    for event in ToyEventGenerator::new(&config).expect("generator").take(200) {
        let result = analyzer.analyze(&event.momenta()).expect("analysis");
        assert!(result.thrust > 0.9, "thrust {}", result.thrust);
        assert!(result.oblateness < 0.2, "oblateness {}", result.oblateness);
    }
}

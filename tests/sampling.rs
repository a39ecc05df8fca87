use schedstat_probe::schedstat::Schedstat;
use schedstat_probe::plugin::{Mode, Plugin};
use schedstat_probe::probe::{Probe, ProbeConfig};
use schedstat_probe::{diff, parse, ClockTicks, Error};

use std::fs;
use std::time::Duration;

const FIRST: &str = "\
version 15
timestamp 4297299139
cpu0 0 0 96548476 28816741 51484452 21431349 2045936778163039 343796328169361 4767485306
domain0 00000000,00000003 8452 8233 72 196734 147 10 0 8233 1101 1091 3 8397 7 0 1091 4 6 0 0 0 0 0 0 0 0 0 0 0 95 0 0
cpu1 0 0 91227418 26820312 48732307 20219916 1967461837547346 327802612356470 4546773102
";

const SECOND: &str = "\
version 15
timestamp 4297299239
cpu0 0 0 96548600 28816800 51484500 21431400 2045936778173039 343796328179361 4767485400
domain0 00000000,00000003 8452 8233 72 196734 147 10 0 8233 1101 1091 3 8397 7 0 1091 4 6 0 0 0 0 0 0 0 0 0 0 0 95 0 0
cpu1 0 0 91227418 26820312 48732307 20219916 1967461837547346 327802612356470 4546773102
";

#[test]
fn two_cpus_diffed_with_itself() {
	let snapshot = parse("cpu0 1 2 3 4 5 6 1000 200 7 0\ncpu1 1 2 3 4 5 6 1000 200 7 0\nintr 1 2 3\n")
		.unwrap();
	assert_eq!(snapshot.len(), 2);

	let deltas = diff(&snapshot, &snapshot, ClockTicks::new(100).unwrap(), 1).unwrap();
	assert_eq!(deltas.len(), 2);
	assert!(deltas.iter().all(|(_, d)| {
		d.run_delay_delta_ticks == 0 && d.cpu_time_delta_ticks == 0
	}));
}

#[test]
fn reload_and_report() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("schedstat");
	fs::write(&path, FIRST).unwrap();

	let mut stat = Schedstat::read_from(&path).unwrap();
	let previous = stat.snapshot().unwrap();

	fs::write(&path, SECOND).unwrap();
	stat.reload_from(&path).unwrap();
	assert_eq!(stat.timestamp(), Some(4297299239));
	let current = stat.snapshot().unwrap();

	let deltas = diff(&previous, &current, ClockTicks::new(100).unwrap(), 1700000000).unwrap();
	let cpu0 = deltas.get("0").unwrap();
	assert_eq!(cpu0.cpu_time_delta_ticks, 10000);
	assert_eq!(cpu0.run_delay_delta_ticks, 10000);

	let mut out = vec![];
	Plugin::default().write_values(&mut out, &deltas).unwrap();
	let out = String::from_utf8(out).unwrap();
	let lines: Vec<_> = out.lines().collect();
	assert_eq!(lines.len(), 4);
	assert_eq!(lines[0], "schedstat.cpu.cpu0.run_delay\t0.100000\t1700000000");
	assert_eq!(lines[1], "schedstat.cpu.cpu0.cpu_time\t0.100000\t1700000000");
}

#[test]
fn dispatch_definitions_skips_sampling() {
	let dir = tempfile::tempdir().unwrap();
	// the file does not exist, definitions must not read it
	let probe = Probe::new(ProbeConfig {
		path: dir.path().join("missing"),
		interval: Duration::ZERO,
		..Default::default()
	});

	let mut out = vec![];
	Plugin::default().dispatch(Mode::Definitions, &probe, &mut out).unwrap();
	assert!(String::from_utf8(out).unwrap().starts_with("# mackerel-agent-plugin\n"));

	let err = Plugin::default().dispatch(Mode::Values, &probe, &mut vec![]).unwrap_err();
	assert!(matches!(err, Error::Io(_)));
}

#[test]
fn dispatch_values() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("schedstat");
	fs::write(&path, FIRST).unwrap();

	let probe = Probe::new(ProbeConfig {
		path,
		interval: Duration::from_millis(10),
		clock_ticks: ClockTicks::new(1000).unwrap()
	});

	let mut out = vec![];
	Plugin::new("sched").dispatch(Mode::Values, &probe, &mut out).unwrap();
	let out = String::from_utf8(out).unwrap();
	assert!(out.starts_with("sched.cpu.cpu0.run_delay\t0.000000\t"));
	assert_eq!(out.lines().count(), 4);
}

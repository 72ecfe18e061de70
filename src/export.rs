use crate::body::Body;
use crate::error::Result;
use crate::integrator::Integrator;
use crate::simulation::{SimulationState, Snapshot};
use chrono::Utc;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

#[derive(Serialize)]
struct PositionRecord {
    snapshot: usize,
    time: f64,
    body: usize,
    x: f64,
    y: f64,
    z: f64,
}

#[derive(Serialize)]
struct BodyRecord<'a> {
    body: usize,
    name: &'a str,
    mass: f64,
    radius: f64,
    red: u8,
    green: u8,
    blue: u8,
    known_period: Option<f64>,
}

#[derive(Serialize)]
struct EnergyRecord {
    snapshot: usize,
    time: f64,
    energy: f64,
}

#[derive(Serialize)]
struct RunRecord {
    date: String,
    label: String,
    integrator: String,
    n_bodies: usize,
    steps: usize,
    interval: usize,
    dt: f64,
    snapshots: usize,
    relative_energy_drift: f64,
    energy_thresholds: String,
}

/// Writes one row per body per snapshot: `snapshot,time,body,x,y,z`.
pub fn write_history<W: Write>(history: &[Snapshot], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for (i, snapshot) in history.iter().enumerate() {
        for (body, pos) in snapshot.positions.iter().enumerate() {
            wtr.serialize(PositionRecord {
                snapshot: i,
                time: snapshot.time,
                body,
                x: pos.x,
                y: pos.y,
                z: pos.z,
            })?;
        }
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the total energy recorded with each snapshot:
/// `snapshot,time,energy`. Rows stop at the shorter of the two inputs.
pub fn write_energy<W: Write>(history: &[Snapshot], energies: &[f64], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for (i, (snapshot, &energy)) in history.iter().zip(energies).enumerate() {
        wtr.serialize(EnergyRecord {
            snapshot: i,
            time: snapshot.time,
            energy,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes per-body metadata needed to label plots.
pub fn write_bodies<W: Write>(bodies: &[Body], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for (i, b) in bodies.iter().enumerate() {
        wtr.serialize(BodyRecord {
            body: i,
            name: b.label(),
            mass: b.mass,
            radius: b.radius,
            red: b.color[0],
            green: b.color[1],
            blue: b.color[2],
            known_period: b.known_period,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes `<label>_positions.csv`, `<label>_energy.csv` and
/// `<label>_bodies.csv` into `dir` and appends a summary row to
/// `dir/runs.csv`.
pub fn export_run(
    dir: impl AsRef<Path>,
    label: &str,
    bodies: &[Body],
    sim: &SimulationState,
    steps: usize,
    interval: usize,
    integrator: Integrator,
) -> Result<()> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    write_history(
        sim.history(),
        std::fs::File::create(dir.join(format!("{label}_positions.csv")))?,
    )?;
    write_energy(
        sim.history(),
        sim.energy_history(),
        std::fs::File::create(dir.join(format!("{label}_energy.csv")))?,
    )?;
    write_bodies(
        bodies,
        std::fs::File::create(dir.join(format!("{label}_bodies.csv")))?,
    )?;

    let record = RunRecord {
        date: Utc::now().to_rfc3339(),
        label: label.to_string(),
        integrator: integrator.to_string(),
        n_bodies: sim.len(),
        steps,
        interval,
        dt: sim.physical_dt(),
        snapshots: sim.history().len(),
        relative_energy_drift: sim.relative_energy_drift(),
        energy_thresholds: serde_json::to_string(&sim.energy_monitor().crossings())?,
    };

    let runs_path = dir.join("runs.csv");
    let file_exists = runs_path.exists();
    let file = OpenOptions::new().append(true).create(true).open(&runs_path)?;
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);
    wtr.serialize(record)?;
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn history_rows() {
        let history = vec![
            Snapshot {
                time: 0.0,
                positions: vec![Vector3::new(1.0, 2.0, 3.0), Vector3::zeros()],
            },
            Snapshot {
                time: 0.5,
                positions: vec![Vector3::new(-1.0, 0.0, 0.0), Vector3::zeros()],
            },
        ];
        let mut buf = Vec::new();
        write_history(&history, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "snapshot,time,body,x,y,z");
        assert_eq!(lines[1], "0,0.0,0,1.0,2.0,3.0");
        assert_eq!(lines[3], "1,0.5,0,-1.0,0.0,0.0");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn energy_rows_follow_snapshots() {
        let history = vec![
            Snapshot {
                time: 0.0,
                positions: vec![Vector3::zeros()],
            },
            Snapshot {
                time: 2.0,
                positions: vec![Vector3::zeros()],
            },
        ];
        let mut buf = Vec::new();
        write_energy(&history, &[-1.5, -1.25], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines, vec!["snapshot,time,energy", "0,0.0,-1.5", "1,2.0,-1.25"]);
    }

    #[test]
    fn exported_run_records_physical_step() {
        let dir = std::env::temp_dir().join(format!("orrery-export-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let bodies = vec![
            Body::new(crate::constants::M_SUN, Vector3::zeros(), Vector3::zeros()),
            Body::on_axis(
                crate::constants::M_EARTH,
                crate::constants::ORBIT_R_EARTH,
                crate::constants::V_EARTH,
            ),
        ];
        let dt = 0.01 * crate::constants::YEAR_IN_S;
        let mut sim = SimulationState::new(&bodies, &crate::SimulationConfig::natural(dt)).unwrap();
        sim.run(4, 2, Integrator::Symplectic).unwrap();
        export_run(&dir, "earth", &bodies, &sim, 4, 2, Integrator::Symplectic).unwrap();

        let energy = std::fs::read_to_string(dir.join("earth_energy.csv")).unwrap();
        assert_eq!(energy.lines().count(), 4);

        let mut rdr = csv::Reader::from_path(dir.join("runs.csv")).unwrap();
        let headers = rdr.headers().unwrap().clone();
        let dt_column = headers.iter().position(|h| h == "dt").unwrap();
        let row = rdr.records().next().unwrap().unwrap();
        let written: f64 = row[dt_column].parse().unwrap();
        assert!((written - dt).abs() <= 1e-9 * dt, "{written} vs {dt}");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn body_rows() {
        let bodies = vec![Body::on_axis(2.0, 1.0, 1.0)
            .with_name("Earth")
            .with_color([25, 180, 200])
            .with_period(1.0)];
        let mut buf = Vec::new();
        write_bodies(&bodies, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text.lines().nth(1),
            Some("0,Earth,2.0,0.0,25,180,200,1.0")
        );
    }
}

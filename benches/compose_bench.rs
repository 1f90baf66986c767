//! Quick benchmark for workflow composition, validation and hashing

use cwlforge::io::{content_hash, to_yaml_string};
use cwlforge::process::{CommandLineTool, Process, ProcessLike};
use cwlforge::types::TypeHint;
use cwlforge::workflow::{Exposure, StepOptions, Workflow};
use std::time::Instant;

fn stage(id: &str) -> CommandLineTool {
    let mut tool = CommandLineTool::new(id).with_base_command(["process"]);
    tool.add_input(&TypeHint::file().required(), "in").unwrap();
    tool.add_input(&TypeHint::int().default(1), "threads").unwrap();
    tool.add_output(&TypeHint::file().required().glob("*.out"), "out").unwrap();
    tool
}

/// A linear chain of `length` steps, each reading the previous step's output.
fn chain(length: usize) -> Workflow {
    let mut wf = Workflow::new("chain");
    for i in 0..length {
        let id = format!("stage{i}");
        let expose = if i == 0 { Exposure::only(["in"]) } else { Exposure::none() };
        wf.add_step(stage(&id), StepOptions::default().expose(expose)).unwrap();
        if i > 0 {
            wf.add_connection(&format!("stage{}.out", i - 1), &format!("{id}.in")).unwrap();
        }
    }
    wf
}

fn main() {
    println!("Workflow Composition Performance Test");
    println!("=====================================\n");

    for length in [10, 100, 500] {
        let iterations = 20;

        let start = Instant::now();
        for _ in 0..iterations {
            let _ = chain(length);
        }
        let compose = start.elapsed() / iterations;

        let wf = chain(length);
        let start = Instant::now();
        for _ in 0..iterations {
            let report = wf.validate();
            assert!(report.is_valid());
        }
        let validate = start.elapsed() / iterations;

        let process = Process::from(wf);
        let start = Instant::now();
        for _ in 0..iterations {
            let _ = content_hash(&process).unwrap();
        }
        let hash = start.elapsed() / iterations;

        let start = Instant::now();
        for _ in 0..iterations {
            let _ = to_yaml_string(&process).unwrap();
        }
        let yaml = start.elapsed() / iterations;

        println!("Chain of {} steps:", length);
        println!("  compose:  {:?}", compose);
        println!("  validate: {:?}", validate);
        println!("  hash:     {:?}", hash);
        println!("  yaml:     {:?}\n", yaml);
    }
}

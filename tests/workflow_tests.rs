//! # Workflow Composition Tests
//!
//! End-to-end composition through the public API:
//! 1. add_step exposure and wiring
//! 2. Connection resolution and feature requirements
//! 3. Scatter expansion on composed workflows
//! 4. Nested workflows and validation

use pretty_assertions::assert_eq;
use serde_json::json;

use cwlforge::process::{CommandLineTool, Process, ProcessLike};
use cwlforge::requirement::{DockerRequirement, Requirement, RequirementKind};
use cwlforge::types::{CwlType, TypeHint};
use cwlforge::workflow::{Exposure, ScatterMethod, StepOptions, StepState, ValidationIssue, Workflow};

// ============================================================================
// TEST HELPERS
// ============================================================================

fn aligner() -> CommandLineTool {
    let mut tool = CommandLineTool::new("bwa_mem").with_base_command(["bwa", "mem"]);
    tool.add_input(&TypeHint::file().required().doc("FASTQ reads"), "reads").unwrap();
    tool.add_input(&TypeHint::file().required().secondary_files(".fai"), "reference").unwrap();
    tool.add_input(&TypeHint::int().default(4), "threads").unwrap();
    tool.add_output(&TypeHint::file().required().glob("*.bam"), "bam").unwrap();
    tool.add_requirement(DockerRequirement::pull("biocontainers/bwa:0.7.17")).unwrap();
    tool
}

fn sorter() -> CommandLineTool {
    let mut tool = CommandLineTool::new("samtools_sort").with_base_command(["samtools", "sort"]);
    tool.add_input(&TypeHint::file().required(), "bam").unwrap();
    tool.add_output(&TypeHint::file().required().glob("*.sorted.bam"), "sorted").unwrap();
    tool
}

fn port_ids<'a>(ids: impl Iterator<Item = &'a String>) -> Vec<&'a str> {
    ids.map(String::as_str).collect()
}

// ============================================================================
// 1. EXPOSURE
// ============================================================================

#[test]
fn test_add_step_creates_one_workflow_port_per_tool_port() {
    let mut wf = Workflow::new("align");
    wf.add_step(aligner(), StepOptions::default()).unwrap();

    assert_eq!(
        port_ids(wf.base.inputs.iter().map(|p| &p.id)),
        vec!["reads", "reference", "threads"]
    );
    assert_eq!(port_ids(wf.base.outputs.iter().map(|p| &p.id)), vec!["bam"]);

    let step = wf.get_step("bwa_mem").unwrap();
    for input in &step.inputs {
        assert_eq!(input.source.single(), Some(input.id.as_str()));
    }
    assert_eq!(wf.get_output("bam").unwrap().output_source.single(), Some("bwa_mem/bam"));

    let reference = wf.get_input("reference").unwrap();
    assert_eq!(reference.secondary_files.as_ref().map(|s| s.as_slice().to_vec()), Some(vec![".fai".to_string()]));
    assert!(reference.default.is_none());
}

#[test]
fn test_chained_steps() {
    let mut wf = Workflow::new("align_sort");
    wf.add_step(aligner(), StepOptions::default().expose(Exposure::only(["reads", "reference"])))
        .unwrap();
    wf.add_step(sorter(), StepOptions::default().expose(Exposure::only(["sorted"])))
        .unwrap();
    wf.add_connection("bwa_mem.bam", "samtools_sort.bam").unwrap();

    let sort = wf.get_step("samtools_sort").unwrap();
    assert_eq!(sort.get_input("bam").unwrap().source.single(), Some("bwa_mem/bam"));
    assert_eq!(sort.readiness(), StepState::Ready);
    assert_eq!(wf.topological_order().unwrap(), vec!["bwa_mem", "samtools_sort"]);

    let report = wf.validate();
    assert!(report.is_valid(), "{:?}", report.errors);
    assert!(!report.has_warnings());
}

#[test]
fn test_failed_add_step_leaves_workflow_unchanged() {
    let mut wf = Workflow::new("wf");
    wf.add_step(aligner(), StepOptions::default()).unwrap();
    let before = wf.clone();

    assert!(wf.add_step(aligner(), StepOptions::default()).is_err());
    assert!(wf
        .add_step(sorter(), StepOptions::default().expose(Exposure::rename([("missing", "x")])))
        .is_err());
    assert!(wf
        .add_step(sorter(), StepOptions::id("bad.id"))
        .is_err());
    assert_eq!(wf, before);
}

// ============================================================================
// 2. CONNECTIONS
// ============================================================================

#[test]
fn test_two_sources_merge_with_feature() {
    let mut wf = Workflow::new("wf");
    wf.add_input(&TypeHint::file().required(), "a").unwrap();
    wf.add_input(&TypeHint::file().required(), "b").unwrap();
    wf.add_step(sorter(), StepOptions::id("step1").expose(Exposure::none()))
        .unwrap();

    wf.add_connection("a", "step1.bam").unwrap();
    wf.add_connection("b", "step1.bam").unwrap();

    let value = Process::from(wf.clone()).to_value().unwrap();
    assert_eq!(value["steps"][0]["in"][0]["source"], json!(["a", "b"]));
    assert!(wf.base.requirements.contains(RequirementKind::MultipleInputFeature));
}

#[test]
fn test_docker_requirement_merged() {
    let mut tool = sorter();
    tool.add_requirement(DockerRequirement::pull("samtools:1.9")).unwrap();
    tool.add_requirement(DockerRequirement::pull("samtools:1.10")).unwrap();

    assert_eq!(tool.base.requirements.len(), 1);
    let Some(Requirement::Docker(docker)) = tool.find_requirement(RequirementKind::Docker) else {
        panic!("expected docker requirement");
    };
    assert_eq!(docker.docker_pull.as_deref(), Some("samtools:1.10"));
}

// ============================================================================
// 3. SCATTER
// ============================================================================

fn depth(t: &CwlType) -> usize {
    match t {
        CwlType::Array(array) => 1 + depth(&array.items),
        _ => 0,
    }
}

#[test]
fn test_scatter_properties() {
    let cases = [
        (vec!["reads"], None, 1),
        (vec!["reads", "reference"], Some(ScatterMethod::NestedCrossproduct), 2),
        (vec!["reads", "reference"], Some(ScatterMethod::FlatCrossproduct), 1),
        (vec!["reads", "reference"], Some(ScatterMethod::Dotproduct), 1),
    ];
    for (ports, method, expected) in cases {
        let mut wf = Workflow::new("wf");
        wf.add_step(aligner(), StepOptions::default().scatter(ports.clone(), method))
            .unwrap();

        assert_eq!(depth(&wf.get_output("bam").unwrap().port_type), expected, "{ports:?} {method:?}");
        for port in &ports {
            assert_eq!(depth(&wf.get_input(port).unwrap().port_type), 1);
        }
        assert_eq!(depth(&wf.get_input("threads").unwrap().port_type), 0);
        assert!(wf.base.requirements.contains(RequirementKind::ScatterFeature));
        assert!(wf.validate().is_valid());
    }
}

// ============================================================================
// 4. NESTED WORKFLOWS
// ============================================================================

#[test]
fn test_subworkflow_step() {
    let mut inner = Workflow::new("inner");
    inner.add_step(sorter(), StepOptions::default()).unwrap();

    let mut outer = Workflow::new("outer");
    outer.add_step(inner, StepOptions::id("sort_all")).unwrap();

    assert!(outer.base.requirements.contains(RequirementKind::SubworkflowFeature));
    assert_eq!(outer.get_output("sorted").unwrap().output_source.single(), Some("sort_all/sorted"));
    assert!(outer.validate().is_valid());
}

#[test]
fn test_constructed_workflow_roundtrip() {
    let mut wf = Workflow::new("align_sort");
    wf.add_step(aligner(), StepOptions::default().scatter(["reads"], None))
        .unwrap();
    wf.add_step(sorter(), StepOptions::default().expose(Exposure::only(["sorted"])))
        .unwrap();
    wf.add_connection("bwa_mem.bam", "samtools_sort.bam").unwrap();

    let process = Process::from(wf);
    let yaml = cwlforge::io::to_yaml_string(&process).unwrap();
    assert_eq!(cwlforge::io::from_yaml_str(&yaml).unwrap(), process);

    let value = process.to_value().unwrap();
    assert_eq!(Process::from_value(value).unwrap(), process);
}

#[test]
fn test_missing_feature_reported_for_hand_built_steps() {
    let yaml = r#"
class: Workflow
id: hand_built
inputs:
  reads: File[]
outputs:
  counts:
    type: File[]
    outputSource: count/out
steps:
  count:
    run: count.cwl
    scatter: input
    in:
      input: reads
    out: [out]
"#;
    let Process::Workflow(wf) = cwlforge::io::from_yaml_str(yaml).unwrap() else {
        panic!("expected workflow");
    };
    let report = wf.validate();
    assert_eq!(
        report.errors,
        vec![ValidationIssue::MissingRequirement {
            kind: RequirementKind::ScatterFeature,
            context: "step 'count' is scattered".to_string(),
        }]
    );
}

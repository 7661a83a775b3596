//! arch-core: Motor lineal determinista del pipeline de generación.
//!
//! El core es neutral: no conoce specs de clases ni capas arquitectónicas,
//! sólo artifacts JSON, steps deterministas, eventos append-only y
//! fingerprints. La semántica de generación vive en `arch-adapters`.
pub mod constants;
pub mod engine;
pub mod errors;
pub mod event;
pub mod hashing;
pub mod injection;
pub mod model;
pub mod registry;
pub mod repo;
pub mod step;

pub use engine::{BatchCtx, BatchEngine};
pub use event::{BatchEvent, BatchEventKind, EventStore, InMemoryEventStore};
pub use model::{Artifact, ArtifactKind};
pub use registry::{ArtifactPaths, ArtifactRegistry, InMemoryArtifactRegistry, MemoryModuleWriter, ModuleWriter};
pub use repo::{build_pipeline_definition, BatchRepository, InMemoryBatchRepository, PipelineDefinition};
pub use step::{ItemSignal, Pipe, SameAs, StepDefinition, StepKind, StepRunResult, StepRunResultTyped, StepStatus,
               TypedStep};

pub use injection::{CompositeInjector, ParamInjector};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::BatchEventKind;

    // Pipeline mínimo con artifacts y steps tipados declarados vía macros.
    typed_artifact!(SpecBatch { value: serde_json::Value });

    typed_step! {
        source SeedStep {
            id: "seed",
            output: SpecBatch,
            params: (),
            run(_me, _p) {
                SpecBatch { value: serde_json::json!(["ClassA", "ClassB"]), schema_version: 1 }
            }
        }
    }

    typed_step! {
        step UppercaseStep {
            id: "uppercase",
            kind: StepKind::Transform,
            input: SpecBatch,
            output: SpecBatch,
            params: (),
            run(_me, inp, _p) {
                let upper: Vec<String> = inp.value
                                            .as_array()
                                            .unwrap_or(&vec![])
                                            .iter()
                                            .filter_map(|v| v.as_str().map(|s| s.to_uppercase()))
                                            .collect();
                SpecBatch { value: serde_json::json!(upper), schema_version: 1 }
            }
        }
    }

    typed_step! {
        step CollectStep {
            id: "collect",
            kind: StepKind::Sink,
            input: SpecBatch,
            output: SpecBatch,
            params: (),
            run(_me, inp, _p) {
                SpecBatch { value: inp.value, schema_version: 1 }
            }
        }
    }

    fn run_once() -> (Option<String>, Vec<&'static str>) {
        let mut engine = BatchEngine::new().first_step(SeedStep::new())
                                           .add_step(UppercaseStep::new())
                                           .add_step(CollectStep::new())
                                           .build();
        engine.run().expect("batch should complete");
        let variants = engine.event_variants().expect("events present");
        (engine.batch_fingerprint(), variants)
    }

    #[test]
    fn pipeline_runs_to_completion_with_expected_event_trace() {
        let (fp, variants) = run_once();
        assert!(fp.is_some(), "batch fingerprint should be present");
        // I S F S F S F C : init, tres steps, cierre.
        assert_eq!(variants, vec!["I", "S", "F", "S", "F", "S", "F", "C"]);
    }

    #[test]
    fn identical_runs_yield_identical_fingerprints() {
        // Idempotencia: mismo pipeline + mismos params => mismo fingerprint
        // agregado, aunque los batch_id difieran.
        let (fp_a, _) = run_once();
        let (fp_b, _) = run_once();
        assert_eq!(fp_a, fp_b);
    }

    #[test]
    fn final_artifact_holds_last_step_output() {
        let mut engine = BatchEngine::new().first_step(SeedStep::new())
                                           .add_step(UppercaseStep::new())
                                           .add_step(CollectStep::new())
                                           .build();
        engine.run().expect("batch should complete");
        let art = engine.final_artifact().expect("final artifact");
        assert_eq!(art.payload["value"], serde_json::json!(["CLASSA", "CLASSB"]));
    }

    #[test]
    fn batch_ctx_drives_the_pipeline() {
        let mut engine = BatchEngine::new().first_step(SeedStep::new())
                                           .add_step(UppercaseStep::new())
                                           .add_step(CollectStep::new())
                                           .build();
        let batch_id = engine.ensure_default_batch_id();
        let definition = engine.default_definition.take().expect("definition");
        {
            let mut ctx = BatchCtx::new(&mut engine, batch_id, &definition);
            assert!(ctx.step().is_ok());
            assert!(ctx.run_n(1).is_ok());
            assert!(ctx.run_to_completion().is_ok());
        }
        engine.set_default_definition(definition);
        assert!(engine.batch_fingerprint().is_some());
    }

    #[test]
    fn step_by_step_then_completed_error() {
        let mut engine = BatchEngine::new().first_step(SeedStep::new())
                                           .add_step(UppercaseStep::new())
                                           .add_step(CollectStep::new())
                                           .build();
        assert!(engine.step().is_ok());
        assert!(engine.step().is_ok());
        assert!(engine.step().is_ok());
        assert!(engine.step().is_err()); // el batch ya completó
    }

    #[test]
    fn injectors_merge_over_base_params() {
        use crate::injection::param_injector::ConstInjector;

        // Step cuyo output refleja sus params efectivos.
        #[derive(Clone, Debug)]
        struct EchoParamsStep;
        #[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
        struct EchoParams {
            greeting: String,
        }
        impl TypedStep for EchoParamsStep {
            type Params = EchoParams;
            type Input = SpecBatch;
            type Output = SpecBatch;
            fn id(&self) -> &'static str { "echo" }
            fn kind(&self) -> StepKind { StepKind::Source }
            fn run_typed(&self, _input: Option<SpecBatch>, params: EchoParams) -> StepRunResultTyped<SpecBatch> {
                StepRunResultTyped::Success { outputs: vec![SpecBatch { value: serde_json::json!(params.greeting),
                                                                        schema_version: 1 }] }
            }
        }

        let mut engine = BatchEngine::new().first_step(EchoParamsStep).build();
        engine.add_injector(Box::new(ConstInjector::new(serde_json::json!({"greeting": "injected"}))));
        engine.run().expect("batch should complete");
        let art = engine.final_artifact().expect("final artifact");
        assert_eq!(art.payload["value"], serde_json::json!("injected"));
    }

    #[test]
    fn item_rejections_are_recorded_and_batch_continues() {
        // Step manual que emite una señal de item rechazado.
        #[derive(Clone, Debug)]
        struct RejectingStep;
        impl TypedStep for RejectingStep {
            type Params = ();
            type Input = SpecBatch;
            type Output = SpecBatch;
            fn id(&self) -> &'static str { "rejecting" }
            fn kind(&self) -> StepKind { StepKind::Source }
            fn run_typed(&self, _input: Option<SpecBatch>, _params: ()) -> StepRunResultTyped<SpecBatch> {
                StepRunResultTyped::SuccessWithSignals {
                    outputs: vec![SpecBatch { value: serde_json::json!([]), schema_version: 1 }],
                    signals: vec![ItemSignal { class_name: "BadClass".to_string(),
                                               error: serde_json::json!({"kind": "schema"}) }],
                }
            }
        }

        let mut engine = BatchEngine::new().first_step(RejectingStep).build();
        engine.run().expect("batch completes despite rejected item");
        let events = engine.get_events().expect("events");
        let rejected: Vec<_> = events.iter()
                                     .filter_map(|e| match &e.kind {
                                         BatchEventKind::ItemRejected { class_name, .. } => Some(class_name.clone()),
                                         _ => None,
                                     })
                                     .collect();
        assert_eq!(rejected, vec!["BadClass".to_string()]);
        assert!(engine.batch_fingerprint().is_some());
    }
}

mod common;

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::json;

use attrgraph::errors::GraphError;
use attrgraph::failure::FailureContext;
use attrgraph::graph::{Graph, GraphBuilder};
use attrgraph::local::LocalWriter;
use attrgraph::sink::MemorySink;
use attrgraph::triplet::{Quality, Triplet, Update};

use common::assert_last_event;

fn ratio_graph(sink: MemorySink) -> Graph {
    GraphBuilder::new()
        .local_attribute("A")
        .local_attribute("B")
        .computed_attribute("C", ["A", "B"], |args| {
            let a = args[0].as_f64().unwrap_or_default();
            let b = args[1].as_f64().unwrap_or_default();
            Ok(Update::Value(json!(a / b)))
        })
        .with_sink(sink)
        .build()
        .unwrap()
}

fn diamond_graph(sink: MemorySink) -> Graph {
    GraphBuilder::new()
        .local_attribute("A")
        .computed_attribute("B", ["A"], |args| {
            Ok(Update::Value(json!(args[0].as_f64().unwrap_or_default() * 10.0)))
        })
        .computed_attribute("C", ["A"], |args| {
            Ok(Update::Value(json!(args[0].as_f64().unwrap_or_default() * 100.0)))
        })
        .computed_attribute("D", ["A", "B", "C"], |args| {
            let sum: f64 = args.iter().filter_map(|t| t.as_f64()).sum();
            Ok(Update::Value(json!(sum)))
        })
        .with_sink(sink)
        .build()
        .unwrap()
}

#[test]
fn computed_attribute_settles_from_bindings() {
    let sink = MemorySink::new();
    let graph = ratio_graph(sink.clone());

    // Reads fail until the first settled value.
    for name in ["A", "B", "C"] {
        assert!(matches!(
            graph.get(name),
            Err(GraphError::NotInitialized { .. })
        ));
    }

    graph.write("A", Triplet::now(json!(21.0))).unwrap();
    assert_eq!(graph.get("A").unwrap().as_f64(), Some(21.0));
    // B is still unset, so C is blocked by a synthesized missing value.
    let err = graph.get("C").err().unwrap();
    assert!(err.to_string().contains("missing value"));

    sink.clear();
    graph.write("B", Triplet::now(json!(7.0))).unwrap();
    assert_eq!(graph.get("B").unwrap().as_f64(), Some(7.0));
    assert_eq!(graph.get("C").unwrap().as_f64(), Some(3.0));
    assert_eq!(graph.get("C").unwrap().quality, Quality::Valid);

    // Exactly one change and one archive event for C, matching payloads.
    assert_eq!(sink.changes_for("C").len(), 1);
    assert_eq!(sink.archives_for("C").len(), 1);
    assert_last_event(&sink, "C", 3.0, Quality::Valid);
}

#[test]
fn diamond_settles_dependents_once_per_cycle() {
    let sink = MemorySink::new();
    let graph = diamond_graph(sink.clone());

    for name in ["A", "B", "C", "D"] {
        assert!(graph.get(name).is_err());
    }

    graph.write("A", Triplet::now(json!(7.0))).unwrap();
    assert_eq!(graph.get("A").unwrap().as_f64(), Some(7.0));
    assert_eq!(graph.get("B").unwrap().as_f64(), Some(70.0));
    assert_eq!(graph.get("C").unwrap().as_f64(), Some(700.0));
    assert_eq!(graph.get("D").unwrap().as_f64(), Some(777.0));

    // One event pair per touched node for the whole cycle.
    for name in ["A", "B", "C", "D"] {
        assert_eq!(sink.changes_for(name).len(), 1, "change events for {name}");
        assert_eq!(sink.archives_for(name).len(), 1, "archive events for {name}");
    }
    assert_last_event(&sink, "D", 777.0, Quality::Valid);
}

#[test]
fn update_fn_can_override_timestamp_and_quality() {
    let ts = Utc.timestamp_opt(2, 0).unwrap();
    let sink = MemorySink::new();
    let graph = GraphBuilder::new()
        .local_attribute("A")
        .local_attribute("B")
        .computed_attribute("C", ["A", "B"], move |args| {
            let a = args[0].as_f64().unwrap_or_default();
            let b = args[1].as_f64().unwrap_or_default();
            Ok(Update::Triplet(Triplet::new(
                json!(a / b),
                ts,
                Quality::Changing,
            )))
        })
        .with_sink(sink.clone())
        .build()
        .unwrap();

    graph.write("A", Triplet::now(json!(21.0))).unwrap();
    graph.write("B", Triplet::now(json!(7.0))).unwrap();

    let c = graph.get("C").unwrap();
    assert_eq!(c.as_f64(), Some(3.0));
    assert_eq!(c.timestamp, ts);
    assert_eq!(c.quality, Quality::Changing);
    assert_last_event(&sink, "C", 3.0, Quality::Changing);
}

#[test]
fn failure_keeps_root_cause_identity_across_hops() {
    let sink = MemorySink::new();
    let graph = ratio_graph(sink.clone());
    graph.write("A", Triplet::now(json!(21.0))).unwrap();
    graph.write("B", Triplet::now(json!(7.0))).unwrap();
    assert_eq!(graph.get("C").unwrap().as_f64(), Some(3.0));
    sink.clear();

    let cause: Arc<dyn std::error::Error + Send + Sync> =
        Arc::new(std::io::Error::other("Ooops"));
    graph
        .fail("B", FailureContext::from_arc(cause.clone()))
        .unwrap();

    // A is untouched, B and C re-raise the very same error object.
    assert_eq!(graph.get("A").unwrap().as_f64(), Some(21.0));
    for name in ["B", "C"] {
        let err = graph.get(name).err().unwrap();
        let ctx = err.failure().expect("failed state");
        assert!(
            Arc::ptr_eq(&ctx.root_cause(), &cause),
            "{name} must expose the original root cause"
        );
    }

    // Exactly one error event pair each, both carrying the shared cause.
    for name in ["B", "C"] {
        let changes = sink.changes_for(name);
        let archives = sink.archives_for(name);
        assert_eq!(changes.len(), 1);
        assert_eq!(archives.len(), 1);
        for event in changes.iter().chain(archives.iter()) {
            let ctx = event.report.failure().expect("error report");
            assert!(Arc::ptr_eq(&ctx.root_cause(), &cause));
        }
    }
}

#[test]
fn diamond_failure_fans_out_with_identical_root_cause() {
    let sink = MemorySink::new();
    let graph = diamond_graph(sink.clone());
    graph.write("A", Triplet::now(json!(7.0))).unwrap();

    let cause: Arc<dyn std::error::Error + Send + Sync> =
        Arc::new(std::io::Error::other("sensor gone"));
    graph
        .fail("A", FailureContext::from_arc(cause.clone()))
        .unwrap();

    for name in ["A", "B", "C", "D"] {
        let err = graph.get(name).err().unwrap();
        let ctx = err.failure().expect("failed state");
        assert!(
            Arc::ptr_eq(&ctx.root_cause(), &cause),
            "{name} must expose the original root cause"
        );
    }
}

#[test]
fn raising_update_fn_becomes_a_fresh_origin() {
    let sink = MemorySink::new();
    let graph = GraphBuilder::new()
        .local_attribute("A")
        .computed_attribute("B", ["A"], |_args| Err("division exploded".into()))
        .computed_attribute("C", ["B"], |args| Ok(Update::Value(args[0].value.clone())))
        .with_sink(sink.clone())
        .build()
        .unwrap();

    graph.write("A", Triplet::now(json!(1.0))).unwrap();

    let b_err = graph.get("B").err().unwrap();
    let b_ctx = b_err.failure().expect("failed state").clone();
    assert!(b_err.to_string().contains("division exploded"));

    // Downstream of the fresh origin, identity is preserved again.
    let c_err = graph.get("C").err().unwrap();
    assert!(c_err.failure().expect("failed state").same_root_cause(&b_ctx));
}

#[test]
fn first_failed_binding_in_declared_order_wins() {
    let sink = MemorySink::new();
    let graph = ratio_graph(sink.clone());
    graph.write("A", Triplet::now(json!(21.0))).unwrap();
    graph.write("B", Triplet::now(json!(7.0))).unwrap();

    let a_cause: Arc<dyn std::error::Error + Send + Sync> =
        Arc::new(std::io::Error::other("A is gone"));
    let b_cause: Arc<dyn std::error::Error + Send + Sync> =
        Arc::new(std::io::Error::other("B is gone"));
    graph
        .fail("B", FailureContext::from_arc(b_cause.clone()))
        .unwrap();
    graph
        .fail("A", FailureContext::from_arc(a_cause.clone()))
        .unwrap();

    // Both bindings are failed; C surfaces the cause of A, its first
    // declared binding, regardless of failure arrival order.
    let err = graph.get("C").err().unwrap();
    let ctx = err.failure().expect("failed state");
    assert!(Arc::ptr_eq(&ctx.root_cause(), &a_cause));
    assert!(!Arc::ptr_eq(&ctx.root_cause(), &b_cause));
}

#[test]
fn writes_recover_failed_subtrees() {
    let sink = MemorySink::new();
    let graph = ratio_graph(sink.clone());
    graph.write("A", Triplet::now(json!(21.0))).unwrap();
    graph.write("B", Triplet::now(json!(7.0))).unwrap();
    graph
        .fail("B", FailureContext::new(std::io::Error::other("glitch")))
        .unwrap();
    assert!(graph.get("C").is_err());

    graph.write("B", Triplet::now(json!(3.0))).unwrap();
    assert_eq!(graph.get("C").unwrap().as_f64(), Some(7.0));
}

#[test]
fn local_writer_feeds_the_graph() {
    let sink = MemorySink::new();
    let graph = diamond_graph(sink.clone());
    let writer = LocalWriter::new(graph.clone());

    writer.write("A", json!(7.0)).unwrap();
    assert_eq!(graph.get("D").unwrap().as_f64(), Some(777.0));

    let err = writer.write("D", json!(1.0)).err().unwrap();
    assert!(matches!(err, GraphError::NotWritable { .. }));
}

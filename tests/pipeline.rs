// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;
use std::sync::Mutex;

use logmgr::ChildParams;
use logmgr::DisplayOptions;
use logmgr::Entry;
use logmgr::Error;
use logmgr::ErrorKind;
use logmgr::LogMgr;
use logmgr::LogMgrBuilder;
use logmgr::Logger;
use logmgr::MessageBuilder;
use logmgr::OutputFormat;
use logmgr::Render;
use logmgr::level::Direction;
use logmgr::level::LevelDef;
use logmgr::level::LevelSet;
use logmgr::transport::Buffer;
use logmgr::transport::Transport;
use logmgr::transport::TransportState;
use logmgr::trap::Trap;

async fn setup(builder: LogMgrBuilder) -> (LogMgr, Arc<Buffer>, Logger) {
    let mgr = builder
        .plain()
        .show(DisplayOptions::minimal())
        .build()
        .unwrap();
    let buffer = Arc::new(Buffer::new(&mgr));
    mgr.add_transport(buffer.clone()).await.unwrap();
    let log = mgr.get_logger().await.unwrap();
    (mgr, buffer, log)
}

fn messages(buffer: &Buffer) -> Vec<String> {
    buffer
        .entries()
        .iter()
        .map(|e| e.message().format(false, OutputFormat::Text))
        .collect()
}

#[tokio::test]
async fn threshold_gating() {
    let (mgr, buffer, log) = setup(LogMgr::builder().levels(LevelSet::min())).await;

    assert!(log.at("debug").unwrap().text("hidden").emit().is_none());
    assert!(log.at("info").unwrap().text("shown").emit().is_some());
    insta::assert_debug_snapshot!(buffer.lines(), @r#"
    [
        "INFO  shown",
    ]
    "#);

    log.set_threshold("warn").unwrap();
    let child = log.child(ChildParams::new().pkg("db"));
    assert_eq!(child.effective_threshold(), Some(1));
    assert!(child.at("info").unwrap().text("filtered").emit().is_none());
    assert!(!child.meets_threshold("info", None).unwrap());
    assert!(child.meets_threshold("info", Some("debug".into())).unwrap());

    mgr.set_threshold("debug").unwrap();
    let verbose = log.child(ChildParams::new());
    verbose.set_threshold("debug").unwrap();
    assert!(verbose.at("debug").unwrap().text("now visible").emit().is_some());
    assert!(log.at("debug").unwrap().text("still filtered").emit().is_none());

    assert_eq!(messages(&buffer).last().unwrap(), "now visible");
}

#[tokio::test]
async fn context_accumulates_down_the_tree() {
    let (_mgr, buffer, log) = setup(
        LogMgr::builder()
            .levels(LevelSet::std())
            .root(ChildParams::new().sid("s1").pkg("app")),
    )
    .await;

    let child = log.child(ChildParams::new().pkg("db").req_id("r1"));
    let grandchild = child.child(ChildParams::new().req_id("r2"));
    grandchild.at("info").unwrap().text("query").emit();
    child.child(ChildParams::new().sid("s2")).at("warn").unwrap().text("slow").emit();

    let entries = buffer.entries();
    assert_eq!(entries[0].session_id(), Some("s1"));
    assert_eq!(entries[0].packages(), ["app", "db"]);
    assert_eq!(entries[0].request_ids(), ["r1", "r2"]);
    assert_eq!(entries[1].session_id(), Some("s2"));
    assert_eq!(entries[1].request_ids(), ["r1"]);
    assert_eq!(log.packages(), ["app"]);
}

#[tokio::test]
async fn queue_drains_in_order_once_ready() {
    let mgr = LogMgr::builder()
        .levels(LevelSet::min())
        .plain()
        .show(DisplayOptions::minimal())
        .build()
        .unwrap();
    let buffer = Arc::new(Buffer::new(&mgr).manual_ready());
    mgr.add_transport(buffer.clone()).await.unwrap();
    let log = mgr.get_logger().await.unwrap();

    for n in 1..=3 {
        log.at("info").unwrap().text("entry").emit_with([n]);
    }
    assert!(buffer.entries().is_empty());
    assert_eq!(mgr.queued(), 3);

    buffer.set_ready(true);
    mgr.flush_queue();
    assert_eq!(mgr.queued(), 0);
    assert_eq!(messages(&buffer), ["entry 1", "entry 2", "entry 3"]);
}

#[tokio::test]
async fn flush_eligible_levels_flush_transports() {
    let (mgr, buffer, log) = setup(LogMgr::builder().levels(LevelSet::std())).await;
    assert_eq!(buffer.flush_count(), 0);

    log.at("info").unwrap().text("routine").emit();
    assert_eq!(buffer.flush_count(), 0);

    log.at("critical").unwrap().text("on fire").emit();
    assert_eq!(buffer.flush_count(), 1);
    assert!(mgr.meets_flush_threshold("fatal"));

    mgr.flush().unwrap();
    assert_eq!(buffer.flush_count(), 2);
}

#[tokio::test]
async fn queued_flush_levels_flush_once_delivered() {
    let mgr = LogMgr::builder()
        .levels(LevelSet::min())
        .plain()
        .show(DisplayOptions::minimal())
        .build()
        .unwrap();
    let buffer = Arc::new(Buffer::new(&mgr).manual_ready());
    mgr.add_transport(buffer.clone()).await.unwrap();
    let log = mgr.get_logger().await.unwrap();

    log.at("info").unwrap().text("a").emit();
    log.at("error").unwrap().text("b").emit();
    log.at("info").unwrap().text("c").emit();
    assert!(buffer.entries().is_empty());
    assert_eq!(mgr.queued(), 3);
    assert_eq!(buffer.flush_count(), 0);

    buffer.set_ready(true);
    mgr.flush_queue();
    assert_eq!(mgr.queued(), 0);
    assert_eq!(messages(&buffer), ["a", "b", "c"]);
    assert_eq!(buffer.flush_count(), 1);
}

fn otel() -> LevelSet {
    LevelSet::new([
        LevelDef::new("error", 17).flush(),
        LevelDef::new("warn", 13).warn(),
        LevelDef::new("info", 9).default_level(),
        LevelDef::new("debug", 5),
        LevelDef::new("trace", 1),
    ])
    .unwrap()
}

#[tokio::test]
async fn ascending_table_gates_end_to_end() {
    let (mgr, buffer, log) = setup(LogMgr::builder().levels(otel())).await;
    assert_eq!(mgr.levels().direction(), Direction::Ascending);

    assert!(log.at("debug").unwrap().text("hidden").emit().is_none());
    assert!(log.at("warn").unwrap().text("careful").emit().is_some());
    assert!(log.at("error").unwrap().text("broken").emit().is_some());
    assert_eq!(messages(&buffer), ["careful", "broken"]);
    assert_eq!(buffer.flush_count(), 1);
    assert!(mgr.meets_threshold("error", None).unwrap());
    assert!(!mgr.meets_threshold("debug", None).unwrap());

    mgr.set_threshold("trace").unwrap();
    assert!(log.at("debug").unwrap().text("visible").emit().is_some());

    let child = log.child(ChildParams::new().pkg("net"));
    child.set_threshold("warn").unwrap();
    assert!(child.at("info").unwrap().text("filtered").emit().is_none());
    assert!(child.at("warn").unwrap().text("kept").emit().is_some());
    assert_eq!(messages(&buffer), ["careful", "broken", "visible", "kept"]);
}

#[tokio::test]
async fn unknown_levels_are_returned_or_trapped() {
    let trapped = Arc::new(Mutex::new(vec![]));
    let (mgr, buffer, log) = setup(
        LogMgr::builder()
            .levels(LevelSet::min())
            .trap(Collect(trapped.clone())),
    )
    .await;

    let err = log.try_emit(Entry::new("LOUD", "x")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownLevel);
    let err = mgr.try_emit(Entry::new("LOUD", "x")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownLevel);
    assert!(trapped.lock().unwrap().is_empty());

    log.emit(Entry::new("LOUD", "x"));
    mgr.emit(Entry::new("LOUD", "x"));
    assert_eq!(
        *trapped.lock().unwrap(),
        [ErrorKind::UnknownLevel, ErrorKind::UnknownLevel]
    );
    assert!(buffer.entries().is_empty());

    log.try_emit(Entry::new("INFO", "known")).unwrap();
    assert_eq!(messages(&buffer), ["known"]);
}

#[tokio::test]
async fn filtered_builder_reaches_no_transport() {
    let (_mgr, buffer, log) = setup(LogMgr::builder().levels(LevelSet::min())).await;

    let entry = log.at("verbose").unwrap().h1("Output").value("5").emit();
    assert!(entry.is_none());
    assert!(buffer.entries().is_empty());

    let entry = log.at("info").unwrap().h1("Output").value(5).emit().unwrap();
    assert_eq!(entry.message().format(false, OutputFormat::Text), "Output 5");
    assert_eq!(buffer.entries().len(), 1);
}

#[tokio::test]
async fn data_is_attached_only_above_threshold() {
    let (_mgr, buffer, log) = setup(LogMgr::builder().levels(LevelSet::min())).await;

    let builder = log.at("spam").unwrap().data(serde_json::json!({"n": 1}));
    assert!(builder.emit().is_none());

    let entry = log
        .at("warn")
        .unwrap()
        .text("retrying")
        .data(serde_json::json!({"attempt": 2}))
        .emit()
        .unwrap();
    assert_eq!(entry.data(), Some(&serde_json::json!({"attempt": 2})));
    assert_eq!(buffer.entries()[0].data(), entry.data());
}

#[tokio::test]
async fn marks_and_response_times() {
    let (_mgr, buffer, log) = setup(LogMgr::builder().levels(LevelSet::min())).await;

    log.mark_as("db");
    assert!(log.demark("db", true).unwrap() >= 0.0);
    assert!(log.demark("db", false).unwrap() >= 0.0);
    let err = log.demark("db", false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingMark);

    log.at("info").unwrap().text("served").ewt(250.0, false).unwrap();
    log.at("info").unwrap().text("cached").ewt(0.0, false).unwrap();
    let mark = log.mark();
    log.at("info").unwrap().text("timed").ewt(&mark, false).unwrap();

    let err = log
        .at("info")
        .unwrap()
        .text("late")
        .ewt(&mark, false)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingMark);

    let messages = messages(&buffer);
    assert_eq!(messages[0], "served (250 ms response)");
    assert_eq!(messages[1], "cached");
    assert!(messages[2].starts_with("timed"));
    assert_eq!(messages.len(), 3);
}

#[tokio::test]
async fn indentation_prefixes_messages() {
    let (mgr, buffer, log) = setup(LogMgr::builder().levels(LevelSet::min())).await;

    log.indent("->").indent(">>");
    log.at("info").unwrap().text("nested").emit();
    log.outdent(1);
    mgr.emit(Entry::new("INFO", "direct"));
    log.at("warn").unwrap().text("once").emit();
    log.nodent();
    log.at("info").unwrap().text("flat").emit();

    assert_eq!(
        messages(&buffer),
        ["-> >> nested", "direct", "-> once", "flat"]
    );
}

#[tokio::test]
async fn threshold_conflicts_warn_once() {
    let (_mgr, buffer, log) = setup(LogMgr::builder().levels(LevelSet::min())).await;

    log.set_threshold("debug").unwrap();
    log.set_threshold("spam").unwrap();
    insta::assert_debug_snapshot!(buffer.lines(), @r#"
    [
        "WARN  Logger threshold DEBUG is less restrictive than LogMgr threshold INFO; the LogMgr threshold will apply",
    ]
    "#);

    let (mgr, buffer, log) = setup(LogMgr::builder().levels(LevelSet::min())).await;
    log.set_threshold("warn").unwrap();
    mgr.set_threshold("debug").unwrap();
    mgr.set_threshold("trace").unwrap();
    assert_eq!(
        messages(&buffer),
        ["LogMgr threshold DEBUG is less restrictive than root Logger threshold WARN; the Logger threshold will apply"]
    );
}

#[tokio::test]
async fn transport_changes_are_reported() {
    let (mgr, buffer, _log) =
        setup(LogMgr::builder().levels(LevelSet::min()).threshold("spam")).await;
    assert_eq!(messages(&buffer), ["Added transport 'buffer'"]);

    let other = Arc::new(Buffer::new(&mgr));
    mgr.add_transport(other.clone()).await.unwrap();
    assert_eq!(mgr.transports().len(), 2);
    assert_eq!(messages(&other), ["Added transport 'buffer'"]);

    assert!(mgr.remove_transport(other.as_ref()).await.unwrap());
    assert_eq!(mgr.transports().len(), 1);
    assert!(!other.ready());
    assert_eq!(
        messages(&buffer),
        [
            "Added transport 'buffer'",
            "Added transport 'buffer'",
            "Removed transport 'buffer'",
        ]
    );
}

#[tokio::test]
async fn custom_builder_factory() {
    let (_mgr, buffer, log) = setup(
        LogMgr::builder()
            .levels(LevelSet::cli())
            .factory(|params| MessageBuilder::new(params).text("[cli]")),
    )
    .await;

    log.at("help").unwrap().text("usage: tool [options]").emit();
    assert_eq!(messages(&buffer), ["[cli] usage: tool [options]"]);
}

#[derive(Debug, Default)]
struct Collect(Arc<Mutex<Vec<ErrorKind>>>);

impl Trap for Collect {
    fn trap(&self, err: &Error) {
        self.0.lock().unwrap().push(err.kind());
    }
}

#[derive(Debug)]
struct Broken(TransportState);

impl Transport for Broken {
    fn kind(&self) -> &'static str {
        "broken"
    }

    fn state(&self) -> &TransportState {
        &self.0
    }

    fn emit(&self, _: &Entry) -> Result<(), Error> {
        Err(Error::new(ErrorKind::Transport, "pipe closed"))
    }
}

#[tokio::test]
async fn transport_failures_are_trapped() {
    let trapped = Arc::new(Mutex::new(vec![]));
    let (_mgr, buffer, log) = setup(
        LogMgr::builder()
            .levels(LevelSet::min())
            .trap(Collect(trapped.clone()))
            .transport(|mgr| Broken(mgr.transport_state())),
    )
    .await;

    log.at("info").unwrap().text("still delivered").emit();
    assert_eq!(messages(&buffer), ["still delivered"]);
    assert_eq!(*trapped.lock().unwrap(), [ErrorKind::Transport]);
}

#[derive(Debug)]
struct FailingSetup(TransportState);

#[async_trait::async_trait]
impl Transport for FailingSetup {
    fn kind(&self) -> &'static str {
        "failing"
    }

    fn state(&self) -> &TransportState {
        &self.0
    }

    async fn setup(&self) -> Result<(), Error> {
        Err(Error::new(ErrorKind::Transport, "device unavailable"))
    }

    fn emit(&self, _: &Entry) -> Result<(), Error> {
        Ok(())
    }
}

#[tokio::test]
async fn failed_setup_leaves_transport_unregistered() {
    let (mgr, buffer, log) = setup(LogMgr::builder().levels(LevelSet::min())).await;
    log.at("info").unwrap().text("before").emit();

    let err = mgr
        .add_transport(Arc::new(FailingSetup(mgr.transport_state())))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(mgr.transports().len(), 1);

    log.at("info").unwrap().text("after").emit();
    log.at("error").unwrap().text("after error").emit();
    assert_eq!(messages(&buffer), ["before", "after", "after error"]);
    assert_eq!(mgr.queued(), 0);
}

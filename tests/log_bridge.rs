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

use logmgr::DisplayOptions;
use logmgr::LogMgr;
use logmgr::bridge::try_setup_log_crate;
use logmgr::level::LevelSet;
use logmgr::transport::Buffer;

#[tokio::test]
async fn test_log_crate_records_reach_transports() {
    let mgr = LogMgr::builder()
        .levels(LevelSet::std())
        .plain()
        .show(DisplayOptions::minimal())
        .build()
        .unwrap();
    let buffer = Arc::new(Buffer::new(&mgr));
    mgr.add_transport(buffer.clone()).await.unwrap();
    try_setup_log_crate(mgr.get_logger().await.unwrap()).unwrap();

    log::error!("disk {} failed", "sda");
    log::info!("mounted");
    log::debug!("filtered out");

    insta::assert_debug_snapshot!(buffer.lines(), @r#"
    [
        "ERROR    disk sda failed",
        "INFO     mounted",
    ]
    "#);
    let data = buffer.entries()[0].data().cloned().unwrap();
    assert_eq!(data["target"], "log_bridge");

    assert!(try_setup_log_crate(mgr.get_logger().await.unwrap()).is_err());
}

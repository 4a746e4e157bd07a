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

use logmgr::ChildParams;
use logmgr::LogMgr;
use logmgr::display::DisplayOptions;
use logmgr::display::TimestampFormat;
use logmgr::layout::JsonLayout;
use logmgr::level::LevelSet;
use logmgr::transport::Console;

#[tokio::main]
async fn main() -> Result<(), logmgr::Error> {
    let mgr = LogMgr::builder()
        .levels(LevelSet::min())
        .threshold("debug")
        .show(DisplayOptions {
            timestamp: Some(TimestampFormat::Utc),
            ..DisplayOptions::default()
        })
        .transport(|mgr| Console::new(mgr).with_layout(JsonLayout::default()))
        .build()?;

    let log = mgr
        .get_logger()
        .await?
        .child(ChildParams::new().sid("session-1").pkg("demo"));
    log.at("info")?
        .text("listening on")
        .value("0.0.0.0:8080")
        .data(serde_json::json!({"workers": 4}))
        .emit();
    log.at("debug")?.text("config loaded").emit();
    log.at("trace")?.text("never shown").emit();

    mgr.stop().await
}

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

use logmgr::LogMgr;
use logmgr::flavor::CliLogger;
use logmgr::level::LevelSet;
use logmgr::transport::Console;

#[tokio::main]
async fn main() -> Result<(), logmgr::Error> {
    let mgr = LogMgr::builder()
        .levels(LevelSet::cli())
        .threshold("prompt")
        .transport(|mgr| Console::new(mgr).stderr())
        .build()?;
    let log = CliLogger::new(mgr.get_logger().await?)?;

    log.help().h1("Usage").text("tool [options] <path>").emit();
    log.indent("  ");
    log.data().label("files").value(12).emit();
    log.warn().warn("2 files skipped").emit();
    log.nodent();

    let mark = log.mark();
    log.prompt().action("sync").path("/tmp/out").ewt(&mark, false)?;

    mgr.stop().await
}

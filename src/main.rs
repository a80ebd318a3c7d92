//Copyright 2024 Felix Engl
//
//Licensed under the Apache License, Version 2.0 (the "License");
//you may not use this file except in compliance with the License.
//You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
//Unless required by applicable law or agreed to in writing, software
//distributed under the License is distributed on an "AS IS" BASIS,
//WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//See the License for the specific language governing permissions and
//limitations under the License.

use std::process::ExitCode;
use clap::Parser;
use crate::args::{consume_args, ConsumedArgs, FeaturizerArgs, Step};
use crate::config::Configs;
use crate::logging::configure_logging;

mod args;
mod config;
mod corpus_io;
mod logging;
mod pipeline;

fn main() -> ExitCode {
    exec_args(FeaturizerArgs::parse())
}

fn exec_args(args: FeaturizerArgs) -> ExitCode {
    match consume_args(args) {
        Ok(ConsumedArgs::RunConfig(mode, configs)) => {
            if let Err(err) = configure_logging(&configs) {
                eprintln!("Failed to configure the logging: {err:?}");
                return ExitCode::FAILURE
            }
            match exec(mode, &configs) {
                Ok(()) => ExitCode::SUCCESS,
                Err(err) => {
                    log::error!("Error: {err:?}");
                    ExitCode::FAILURE
                }
            }
        }
        Ok(ConsumedArgs::Init(output)) => {
            match pipeline::init(&output) {
                Ok(()) => {
                    println!("Wrote the default config to {output}.");
                    ExitCode::SUCCESS
                }
                Err(err) => {
                    eprintln!("Error: {err:?}");
                    ExitCode::FAILURE
                }
            }
        }
        Err(err) => {
            eprintln!("Failed to load the config: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Execute the selected [step]
fn exec(step: Step, configs: &Configs) -> anyhow::Result<()> {
    if let Some(threads) = configs.system.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads.get())
            .build_global()?;
    }
    match step {
        Step::Collect { corpus, output } => {
            pipeline::collect(configs, &corpus, output.as_deref())?;
        }
        Step::Select { statistics, output } => {
            pipeline::select(configs, statistics.as_deref(), output.as_deref())?;
        }
        Step::Extract { corpus, vocabulary, output, sparse } => {
            pipeline::extract(configs, &corpus, vocabulary.as_deref(), &output, sparse)?;
        }
        Step::Homogenize { mode, output, inputs } => {
            pipeline::homogenize(&inputs, mode, &output)?;
        }
    }
    Ok(())
}

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde_json::Value;

use rust_apn::codegen::generate_code;
use rust_apn::config::Settings;
use rust_apn::net::{read_net, InputData, Net};
use rust_apn::options::{Action, Options};
use rust_apn::sim::{InputValues, LogGraphics, Simulation, Simulator};

/// Declared inputs with their initial values, overlaid by the inputs file.
struct FileInputs {
    path: Option<PathBuf>,
    last: InputValues,
}

impl FileInputs {
    fn new(path: Option<PathBuf>, declared: &[InputData]) -> Self {
        let last = declared
            .iter()
            .map(|input| (input.name.clone(), input.initial_number()))
            .collect();
        Self { path, last }
    }

    fn read(&mut self) -> InputValues {
        let Some(path) = &self.path else {
            return self.last.clone();
        };
        match load_inputs(path) {
            Ok(values) => self.last.extend(values),
            Err(err) => log::warn!("keeping previous inputs: {err:#}"),
        }
        self.last.clone()
    }
}

fn load_inputs(path: &Path) -> Result<InputValues> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read inputs file: {:?}", path))?;
    let object: serde_json::Map<String, Value> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse inputs file: {:?}", path))?;
    let mut values = InputValues::new();
    for (name, value) in object {
        let number = match value {
            Value::Bool(b) => f64::from(u8::from(b)),
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            other => bail!("input {name} has a non-numeric value {other}"),
        };
        values.insert(name, number);
    }
    Ok(values)
}

fn assemble(path: &Path) -> Result<Net> {
    let data = read_net(path).with_context(|| format!("Failed to load net: {:?}", path))?;
    Net::from_data(&data).map_err(|err| {
        anyhow::anyhow!("{err}").context(format!("invalid element {}", err.element_id()))
    })
}

async fn simulate(
    options: &Options,
    ticks: u64,
    inputs: Option<PathBuf>,
    mode: Option<rust_apn::net::SimModeKind>,
    json: bool,
) -> Result<()> {
    let settings = Settings::load_from_file(&options.config)?;
    log::debug!("settings: {:?}", settings);
    let net = assemble(&options.net)?;
    let mode = mode.unwrap_or(net.sim_config().sim_mode);
    let mut source = FileInputs::new(inputs, net.inputs());
    let graphics = LogGraphics::new(settings.fire_animation());
    let simulation = Simulation::with_mode(net, move || source.read(), graphics, &settings, mode);

    let mut simulator = Simulator::new(simulation);
    let handle = simulator.handle();
    if ticks == 0 {
        handle.stop();
    } else {
        handle.start();
    }
    let mut output_error = None;
    simulator
        .run(|report, handle| {
            if json {
                match serde_json::to_string(report) {
                    Ok(line) => println!("{line}"),
                    Err(err) => output_error = Some(err),
                }
            } else {
                println!("{report}");
            }
            if report.tick >= ticks || output_error.is_some() {
                handle.stop();
            }
        })
        .await?;
    if let Some(err) = output_error {
        return Err(err).context("Failed to encode tick report");
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    if std::env::var("PN_LOG").is_ok() {
        let e = env_logger::Env::new()
            .filter("PN_LOG")
            .write_style("PN_LOG_STYLE");
        env_logger::init_from_env(e);
    }

    let mut flags = shellwords::split(&std::env::var("PN_FLAGS").unwrap_or_default())
        .context("Failed to split PN_FLAGS")?;
    flags.extend(std::env::args().skip(1));
    let options = match Options::parse_from_args(&flags) {
        Ok(options) => options,
        Err(err) => match err.downcast::<clap::Error>() {
            Ok(clap_err) => clap_err.exit(),
            Err(err) => bail!("{err}"),
        },
    };
    log::debug!("PN options: {:?}", options);

    match options.action.clone() {
        Action::Check => {
            let net = assemble(&options.net)?;
            println!(
                "{}: {} places, {} transitions, {} arcs",
                options.net.display(),
                net.places().len(),
                net.transitions().len(),
                net.arcs().len()
            );
        }
        Action::Simulate {
            ticks,
            inputs,
            mode,
            json,
        } => simulate(&options, ticks, inputs, mode, json).await?,
        Action::Codegen { output } => {
            let data = read_net(&options.net)
                .with_context(|| format!("Failed to load net: {:?}", options.net))?;
            let code = generate_code(&data).map_err(|err| {
                anyhow::anyhow!("{err}").context(format!("invalid element {}", err.element_id()))
            })?;
            match output {
                Some(path) => fs::write(&path, code)
                    .with_context(|| format!("Failed to write program: {:?}", path))?,
                None => println!("{code}"),
            }
        }
    }
    Ok(())
}

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use composecore::Value;
use composeruntime::{config, CompositeFactory, GraphBuilder, ModuleRegistry};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "composer")]
#[command(about = "Model composer CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a graph config file
    Run {
        /// Path to the graph YAML file
        file: PathBuf,

        /// Input values as YAML scalars or sequences, one per entry argument
        #[arg(short, long)]
        input: Vec<String>,

        /// Print the result as JSON instead of YAML
        #[arg(long)]
        json: bool,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate a graph config file without building its modules
    Validate {
        /// Path to the graph YAML file
        file: PathBuf,
    },

    /// List available module types
    Modules,

    /// Generate per-module config files from a template and a params file
    Generate {
        /// Path to the template YAML file
        template: PathBuf,

        /// Path to the hyperparameters YAML file
        params: PathBuf,

        /// Keep existing hyperparameter values instead of replacing them
        #[arg(long)]
        no_overwrite: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            input,
            json,
            verbose,
        } => {
            if verbose {
                tracing_subscriber::fmt()
                    .with_max_level(tracing::Level::DEBUG)
                    .init();
            } else {
                tracing_subscriber::fmt()
                    .with_max_level(tracing::Level::INFO)
                    .init();
            }

            run_graph(file, input, json)?;
        }

        Commands::Validate { file } => {
            validate_graph(file)?;
        }

        Commands::Modules => {
            list_modules()?;
        }

        Commands::Generate {
            template,
            params,
            no_overwrite,
        } => {
            generate_configs(template, params, !no_overwrite)?;
        }
    }

    Ok(())
}

/// Registry with every standard module plus a "composed" type whose config
/// is a nested graph built against the standard modules.
fn standard_registry() -> Result<ModuleRegistry> {
    let mut inner = ModuleRegistry::new();
    composenodes::register_all(&mut inner)?;

    let mut registry = ModuleRegistry::new();
    composenodes::register_all(&mut registry)?;
    registry.register(Arc::new(CompositeFactory::new("composed", Arc::new(inner))))?;
    Ok(registry)
}

fn run_graph(file: PathBuf, raw_inputs: Vec<String>, json: bool) -> Result<()> {
    println!("🚀 Loading graph from: {}", file.display());

    let spec = config::load_graph(&file)?;
    let registry = standard_registry()?;
    let graph = GraphBuilder::new(&registry).build(&spec)?;

    println!("📋 Graph: {}", graph.plan().name());
    println!("   Execution order: {}", graph.plan().order().join(" -> "));
    println!();

    let args = raw_inputs
        .iter()
        .map(|raw| {
            serde_yaml::from_str::<Value>(raw)
                .with_context(|| format!("failed to parse input value: {raw}"))
        })
        .collect::<Result<Vec<Value>>>()?;

    let output = graph.forward(&args)?;

    println!("📤 Result:");
    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", serde_yaml::to_string(&output)?);
    }
    Ok(())
}

fn validate_graph(file: PathBuf) -> Result<()> {
    println!("🔍 Validating graph: {}", file.display());

    let spec = config::load_graph(&file)?;
    let registry = ModuleRegistry::new();
    let plan = GraphBuilder::new(&registry).validate(&spec)?;

    println!("✅ Graph is valid:");
    println!("   Name: {}", plan.name());
    println!("   Entry arity: {}", plan.input_arity("entry").unwrap_or(0));
    println!("   Execution order: {}", plan.order().join(" -> "));
    println!(
        "   Returns: {}",
        if plan.returns_map() { "mapping" } else { "tuple" }
    );
    Ok(())
}

fn list_modules() -> Result<()> {
    println!("📦 Available module types:");
    println!();

    let registry = standard_registry()?;
    for type_name in registry.list_types() {
        println!("  • {}", type_name);
    }
    Ok(())
}

/// Generate one config file per entry of the params file, replacing the
/// template's `hyper_params` with that entry's values.
fn generate_configs(template: PathBuf, params: PathBuf, overwrite: bool) -> Result<()> {
    let template_tree = read_yaml(&template)?;
    let Value::Map(template_map) = template_tree else {
        bail!("template file {} must hold a mapping", template.display());
    };
    let params_tree = read_yaml(&params)?;
    let Value::Map(param_sets) = params_tree else {
        bail!("params file {} must hold a mapping", params.display());
    };

    let out_dir = params.parent().unwrap_or_else(|| Path::new(""));

    for (module_name, module_params) in &param_sets {
        let Value::Map(module_params) = module_params else {
            bail!("params for '{module_name}' must be a mapping");
        };

        let mut generated = template_map.clone();
        match generated.get_mut("hyper_params") {
            None => {
                generated.insert(
                    "hyper_params".to_string(),
                    Value::Map(module_params.clone()),
                );
            }
            Some(Value::Map(existing)) => {
                for (key, value) in module_params {
                    if existing.contains_key(key) && !overwrite {
                        println!(
                            "Warning: {key} already exists in hyper_params. \
                             Drop --no-overwrite to replace."
                        );
                        continue;
                    }
                    existing.insert(key.clone(), value.clone());
                }
            }
            Some(_) => bail!("'hyper_params' in the template must be a mapping"),
        }
        generated.insert("name".to_string(), Value::Str(module_name.clone()));

        let out_path = out_dir.join(format!("{module_name}.yaml"));
        std::fs::write(&out_path, serde_yaml::to_string(&Value::Map(generated))?)
            .with_context(|| format!("failed to write {}", out_path.display()))?;
        println!("Generated {}", out_path.display());
    }
    Ok(())
}

fn read_yaml(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

//! Command-line interface for coursegen
//!
//! # Usage
//!
//! ```bash
//! # GigaChat credentials (or HF_TOKEN for the HuggingFace engine)
//! export GIGA_CLIENT_ID=...
//! export GIGA_CLIENT_SECRET=...
//!
//! coursegen templates
//! coursegen models
//! coursegen generate -t module_prompt.j2 -P course_name=Rust -P module_count=4
//! coursegen course --name Rust --sections 4 --lessons-per-section 3
//! coursegen chat --engine raw_giga
//! ```

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use coursegen_context::{Feedback, FeedbackSummarizer, InMemoryFeedbackStore};
use coursegen_generation::chat::{ChatOptions, ChatService, ChatStore};
use coursegen_generation::result::MODEL_KEY;
use coursegen_generation::{
    Course, CourseOutline, CourseStructure, Generator, OutputMode, PromptRequest, course_params,
};
use coursegen_prompt::Language;
use coursegen_utils::Config;
use serde_json::{Map, Value};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "coursegen")]
#[command(version, about = "Generate course content with LLM providers", long_about = None)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a template (or send a prompt) and print the model reply
    Generate(GenerateArgs),
    /// Generate the module outline of a course
    Course(CourseArgs),
    /// List available models per engine
    Models,
    /// List prompt templates
    Templates,
    /// Interactive chat
    Chat(ChatArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Template identifier, e.g. module_prompt.j2
    #[arg(short, long, conflicts_with = "prompt")]
    template: Option<String>,

    /// Literal prompt text
    #[arg(short, long)]
    prompt: Option<String>,

    /// Template parameter as key=value; JSON values are parsed
    #[arg(short = 'P', long = "param", value_parser = parse_param)]
    params: Vec<(String, Value)>,

    /// JSON object file with template parameters
    #[arg(long)]
    params_file: Option<PathBuf>,

    #[arg(short, long)]
    engine: Option<String>,

    #[arg(short, long)]
    model: Option<String>,

    /// Print the reply as text instead of decoding JSON
    #[arg(long)]
    text: bool,

    /// Do not query external search sources
    #[arg(long)]
    no_external: bool,

    /// Search query for external context (defaults to course_name / lesson_title)
    #[arg(long)]
    query: Option<String>,

    /// JSON array of feedback rows to summarize
    #[arg(long)]
    feedback_file: Option<PathBuf>,

    /// Lesson whose feedback is summarized
    #[arg(long)]
    lesson_id: Option<i64>,

    /// Language code for external search and template variants
    #[arg(long)]
    language: Option<String>,

    #[arg(long)]
    max_tokens: Option<usize>,
}

#[derive(Args, Debug)]
struct CourseArgs {
    #[arg(long)]
    name: String,

    #[arg(long)]
    description: Option<String>,

    #[arg(long)]
    level: Option<String>,

    /// Number of modules
    #[arg(long, default_value_t = 4)]
    sections: u32,

    #[arg(long, default_value_t = 3)]
    lessons_per_section: u32,

    #[arg(long, default_value = "module_prompt.j2")]
    template: String,

    #[arg(short, long)]
    engine: Option<String>,

    #[arg(short, long)]
    model: Option<String>,

    /// Print the decoded JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct ChatArgs {
    /// raw_giga, raw_hf, lc_giga or lc_hf
    #[arg(short, long)]
    engine: Option<String>,

    #[arg(short, long)]
    model: Option<String>,

    #[arg(long, default_value_t = 1)]
    user: i64,

    /// Decode every answer as JSON
    #[arg(long)]
    json: bool,

    #[arg(long)]
    max_tokens: Option<usize>,
}

fn parse_param(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty parameter name in '{raw}'"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

async fn read_params_file(path: &Path) -> anyhow::Result<Map<String, Value>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    match serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))? {
        Value::Object(map) => Ok(map),
        _ => bail!("{} must contain a JSON object", path.display()),
    }
}

async fn load_feedback(path: &Path) -> anyhow::Result<InMemoryFeedbackStore> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let rows: Vec<Feedback> =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;

    let store = InMemoryFeedbackStore::new();
    for row in rows {
        store.add(row).await;
    }
    Ok(store)
}

async fn run_generate(generator: Generator, config: &Config, args: GenerateArgs) -> anyhow::Result<()> {
    let mut params = match &args.params_file {
        Some(path) => read_params_file(path).await?,
        None => Map::new(),
    };
    params.extend(args.params);

    let generator = match &args.feedback_file {
        Some(path) => {
            let store = load_feedback(path).await?;
            generator.with_feedback(FeedbackSummarizer::new(Arc::new(store)))
        }
        None => generator,
    };

    let builder = match (args.template, args.prompt) {
        (Some(template), _) => PromptRequest::template(template),
        (None, Some(prompt)) => PromptRequest::prompt(prompt),
        (None, None) => PromptRequest::builder(),
    };
    let mut builder = builder
        .params(Value::Object(params))
        .engine(args.engine.unwrap_or_else(|| config.default_engine.clone()))
        .maybe_model(args.model)
        .external_context(!args.no_external)
        .language(Language::from_code(
            args.language.as_deref().unwrap_or(&config.default_language),
        ))
        .max_tokens(args.max_tokens.unwrap_or(config.default_max_tokens))
        .output(if args.text {
            OutputMode::Text
        } else {
            OutputMode::Structured
        });
    if let Some(query) = args.query {
        builder = builder.search_query(query);
    }
    if let Some(lesson_id) = args.lesson_id {
        builder = builder.lesson_id(lesson_id);
    }

    let result = generator.generate(&builder.build()).await?;
    match result.text() {
        Some(text) => println!("{text}"),
        None => println!("{}", serde_json::to_string_pretty(&result.to_json())?),
    }
    Ok(())
}

async fn run_course(generator: &Generator, config: &Config, args: CourseArgs) -> anyhow::Result<()> {
    let mut course = Course::new(args.name);
    course.description = args.description;
    course.level = args.level;
    let structure = CourseStructure::new(args.sections, args.lessons_per_section);

    let engine = args.engine.unwrap_or_else(|| config.default_engine.clone());
    let value = generator
        .generate_json(
            &args.template,
            &engine,
            args.model.as_deref(),
            course_params(&course, Some(&structure)),
        )
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let outline = CourseOutline::from_generated(&value)?;
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Модуль", "Уроки", "Тесты", "Задания"]);
    for (index, module) in outline.modules.iter().enumerate() {
        let lessons = module
            .lessons
            .iter()
            .map(|lesson| lesson.title.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        table.add_row(vec![
            (index + 1).to_string(),
            module.title.clone(),
            lessons,
            module.tests.len().to_string(),
            module.tasks.len().to_string(),
        ]);
    }
    println!("{table}");
    if let Some(model) = value.get(MODEL_KEY).and_then(Value::as_str) {
        println!("model: {model}");
    }
    Ok(())
}

async fn run_models(generator: &Generator) -> anyhow::Result<()> {
    let listings = generator.list_models().await;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Engine", "Aliases", "Models"]);
    for engine in generator.engines().engines() {
        let aliases = generator
            .engines()
            .descriptor(engine)
            .map(|d| d.aliases().join(", "))
            .unwrap_or_default();
        let models = listings
            .iter()
            .find(|listing| listing.engine == engine)
            .map_or_else(
                || "(unavailable)".to_string(),
                |listing| listing.models.join("\n"),
            );
        table.add_row(vec![engine.to_string(), aliases, models]);
    }
    println!("{table}");
    Ok(())
}

fn run_templates(generator: &Generator) -> anyhow::Result<()> {
    let templates = generator.prompts().list()?;
    if templates.is_empty() {
        println!("no templates found");
    }
    for name in templates {
        println!("{name}");
    }
    Ok(())
}

async fn run_chat(generator: &Generator, config: &Config, args: ChatArgs) -> anyhow::Result<()> {
    let service = ChatService::new(ChatStore::new(), generator.engines().clone());
    let chat = service.store().create_chat(args.user, None).await;
    let mut options = ChatOptions {
        engine: args.engine,
        model: args.model,
        expect_json: args.json,
        max_tokens: args.max_tokens.unwrap_or(config.default_max_tokens),
    };

    println!("Chat #{} ({}). /model <id> to switch model, /exit to quit.", chat.id, chat.name);
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            println!();
            break;
        }
        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if input == "/exit" {
            break;
        }
        if let Some(model) = input.strip_prefix("/model ") {
            options.model = Some(model.trim().to_string());
            println!("model set to {}", model.trim());
            continue;
        }

        match service.chat_generate(chat.id, args.user, input, &options).await {
            Ok(reply) => match reply.structured {
                Some(value) => println!("{}\n", serde_json::to_string_pretty(&value)?),
                None => println!("{}\n", reply.answer),
            },
            Err(e) => eprintln!("Error: {e}\n"),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    coursegen_utils::init_tracing_with(&config.log_level, config.log_json || cli.log_json);

    info!(environment = %config.environment, prompts_dir = %config.prompts_dir.display(), "Starting coursegen");
    let generator = Generator::from_config(&config)?;

    match cli.command {
        Command::Generate(args) => run_generate(generator, &config, args).await,
        Command::Course(args) => run_course(&generator, &config, args).await,
        Command::Models => run_models(&generator).await,
        Command::Templates => run_templates(&generator),
        Command::Chat(args) => run_chat(&generator, &config, args).await,
    }
}

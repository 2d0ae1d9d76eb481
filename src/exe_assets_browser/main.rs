use asset_kiln::{AnyAsset, AssetManager, AssetNotification, AssetsConfig, HotReloadMode, TomlRead};
use clap::{Parser, Subcommand};
use crossbeam::channel::{bounded, Receiver, TryRecvError};
use nab_kiln::app::{set_panic_hook, AppFolder, AppRun, ExitReason};
use nab_kiln::format_binary;
use std::io::Read;
use std::path::PathBuf;
use std::time::{Duration, Instant};

const USER_CONFIG_FILE: &str = "assets_browser.toml";

#[derive(Debug, Subcommand)]
enum CliCommands
{
    #[clap(about = "List every cached asset and its kind")]
    List,
    #[clap(about = "Show details about one asset")]
    Show
    {
        name: String,
    },
    #[clap(about = "Watch the assets root and reload changed files until stdin closes")]
    Watch
    {
        // stop after this many seconds
        #[arg(long)]
        duration_secs: Option<u64>,
    },
    #[clap(about = "List the file extensions that can be imported")]
    Extensions,
}

#[derive(Debug, Parser)]
struct CliArgs
{
    #[command(subcommand)]
    command: CliCommands,

    // defaults to the assets folder next to the executable
    #[arg(long)]
    root: Option<PathBuf>,

    // TOML file with an AssetsConfig. Defaults to the per-user settings folder's assets_browser.toml, if present
    #[arg(long)]
    config: Option<PathBuf>,

    // start the file watcher (implied by the watch command)
    #[arg(long)]
    watch: bool,

    #[arg(long)]
    debounce_ms: Option<u64>,
}

fn load_config(app_run: &AppRun<CliArgs>) -> Result<AssetsConfig, asset_kiln::ConfigError>
{
    let args = &app_run.args;
    let user_config = app_run.get_app_folder(AppFolder::PerUserSettings).join(USER_CONFIG_FILE);
    let mut config = match &args.config
    {
        Some(path) => AssetsConfig::load_file(path)?,
        None if user_config.is_file() =>
        {
            log::debug!("Using config {user_config:?}");
            AssetsConfig::load_file(&user_config)?
        },
        None => AssetsConfig::with_root(app_run.get_app_folder(AppFolder::Assets)),
    };

    if let Some(root) = &args.root
    {
        config.assets_root = root.clone();
    }
    if let Some(debounce_ms) = args.debounce_ms
    {
        config.watch_debounce_ms = debounce_ms;
    }
    if args.watch || matches!(args.command, CliCommands::Watch { .. })
    {
        config.enable_fs_watcher = true;
        config.hot_reload = HotReloadMode::Queued;
    }
    Ok(config)
}

fn describe(asset: &AnyAsset) -> String
{
    match asset
    {
        AnyAsset::Untyped(h) =>
        {
            format!("{:#}B of data", format_binary!(h.payload().bytes.len()))
        },
        AnyAsset::Texture(h) =>
        {
            let tex = h.payload();
            format!("{}x{} RGBA8, {:#}B", tex.width, tex.height, format_binary!(tex.byte_len()))
        },
        AnyAsset::Shader(h) =>
        {
            let shader = h.payload();
            let stages: Vec<String> = shader.stages.iter().map(|s| format!("{:?} ({})", s.stage, s.path.display())).collect();
            format!("stages: {}, source hash {:016x}", stages.join(", "), shader.source_hash)
        },
        AnyAsset::Material(h) =>
        {
            let material = h.payload();
            format!("shader '{}', {} propertie(s)", material.shader, material.properties.len())
        },
        AnyAsset::Font(h) =>
        {
            let font = h.payload();
            match font.num_tables()
            {
                Some(tables) => format!("{:?}, {tables} table(s), {}px", font.format, font.pixel_size),
                None => format!("{:?}, truncated offset table, {}px", font.format, font.pixel_size),
            }
        },
        AnyAsset::Mesh(h) =>
        {
            let mesh = h.payload();
            format!("{} vertices, {} triangle(s) in {} submesh(es), bounds {:?}..{:?}",
                mesh.vertices.len(),
                mesh.triangle_count(),
                mesh.submeshes.len(),
                mesh.bounds_min,
                mesh.bounds_max)
        },
        AnyAsset::Script(h) =>
        {
            let script = h.payload();
            format!("{:?} '{}', {} line(s)", script.language, script.name, script.source.lines().count())
        },
    }
}

// signals once stdin reaches EOF. None if the watching thread could not start
fn stdin_closed() -> Option<Receiver<()>>
{
    let (send, recv) = bounded(1);
    let spawned = std::thread::Builder::new()
        .name("stdin watcher".to_string())
        .spawn(move ||
        {
            let mut sink = Vec::new();
            let _ = std::io::stdin().read_to_end(&mut sink);
            let _ = send.send(());
        });

    match spawned
    {
        Ok(_) => Some(recv),
        Err(err) =>
        {
            log::error!("Failed to watch stdin, only --duration-secs or a kill will stop watching: {err}");
            None
        }
    }
}

// stdin reached EOF, or its thread went away without saying so
fn should_stop(eof: Option<&Receiver<()>>) -> bool
{
    eof.is_some_and(|s| !matches!(s.try_recv(), Err(TryRecvError::Empty)))
}

fn watch(assets: &AssetManager, duration: Option<Duration>)
{
    let Ok(notifications) = assets.subscribe_to_notifications() else { return; };
    if !assets.is_watching()
    {
        log::warn!("File watching is unavailable, nothing will reload");
    }

    let stop = stdin_closed();
    let start = Instant::now();
    loop
    {
        #[cfg(feature = "frame_profiler")]
        puffin::GlobalProfiler::lock().new_frame();

        if should_stop(stop.as_ref()) { break; }
        if duration.is_some_and(|d| start.elapsed() >= d) { break; }

        assets.process_changes();
        for notification in notifications.try_iter()
        {
            match notification
            {
                AssetNotification::Imported(name) => log::info!("+ {name}"),
                AssetNotification::Reloaded(name) => log::info!("~ {name}"),
                AssetNotification::Failed(name) => log::warn!("! {name}"),
            }
        }

        std::thread::sleep(Duration::from_millis(100));
    }
}

fn main() -> ExitReason
{
    let app_run = AppRun::<CliArgs>::startup("Assets Browser", env!("CARGO_PKG_VERSION"));
    set_panic_hook(false);

    #[cfg(feature = "frame_profiler")]
    puffin::set_scopes_on(true);

    let config = match load_config(&app_run)
    {
        Ok(config) => config,
        Err(err) =>
        {
            log::error!("Failed to load config: {err}");
            app_run.set_exit_reason(ExitReason::StartupFailure);
            return ExitReason::StartupFailure;
        }
    };

    let mut assets = AssetManager::new();
    let summary = assets.initialize(config);
    log::debug!("Initial scan: {summary}");

    match &app_run.args.command
    {
        CliCommands::List =>
        {
            for name in assets.names()
            {
                let kind = assets.asset_type_of(&name).map_or("?", |t| t.name());
                println!("{name:<48} {kind}");
            }
        },
        CliCommands::Show { name } =>
        {
            match assets.get_any(name)
            {
                Ok(asset) => println!("{name} [{}]: {}", asset.asset_type().name(), describe(&asset)),
                Err(err) => log::error!("{err}"),
            }
        },
        CliCommands::Watch { duration_secs } =>
        {
            watch(&assets, duration_secs.map(Duration::from_secs));
        },
        CliCommands::Extensions =>
        {
            for (extension, kind) in assets.registered_kinds()
            {
                println!("{extension:<12} {}", kind.name());
            }
        },
    }

    assets.shutdown();
    app_run.get_exit_reason()
}

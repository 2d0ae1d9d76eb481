use std::fmt::Debug;
use std::io::Read;
use std::panic::PanicHookInfo;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicI32, Ordering};

// workspace crates that log at the app's verbosity
const WORKSPACE_CRATES: [&str; 2] = ["asset_kiln", "nab_kiln"];

pub enum AppFolder
{
    Assets, // next to the executable
    PerUserSettings,
}

fn app_folder(app_name: &str, app_dir: &Path, folder: AppFolder) -> PathBuf
{
    match folder
    {
        AppFolder::Assets => app_dir.join("assets"),
        AppFolder::PerUserSettings => match directories::ProjectDirs::from("", "", app_name)
        {
            Some(dirs) => dirs.config_dir().to_path_buf(),
            None => app_dir.to_path_buf(),
        },
    }
}

fn joined<I>(separator: &str, iter: I) -> String
where I: Iterator,
      I::Item: std::fmt::Display
{
    let mut out = String::new();
    for (i, item) in iter.enumerate()
    {
        if i > 0 { out.push_str(separator); }
        out.push_str(item.to_string().as_str());
    }
    out
}

pub trait CliArgs: clap::Parser + Debug { }
impl<T: clap::Parser + Debug> CliArgs for T { }

fn crate_name<T>() -> &'static str
{
    let name = std::any::type_name::<T>();
    match name.find("::")
    {
        Some(i) => &name[0..i],
        None => name,
    }
}

#[derive(Debug)]
pub struct AppRun<TCliArgs: CliArgs>
{
    pub app_name: &'static str,
    pub version_str: &'static str,

    pub start_time: chrono::DateTime<chrono::Local>,
    pub args: TCliArgs,
    pub pid: u32,
    pub is_elevated: bool,

    pub app_dir: PathBuf, // where the app exe is located (distinct from working dir)

    exit_reason: AtomicI32,
}
impl<TCliArgs: CliArgs> AppRun<TCliArgs>
{
    pub fn startup(app_name: &'static str, app_version: &'static str) -> Self
    {
        #[cfg(debug_assertions)]
        let default_log_levels = (log::LevelFilter::Warn, log::LevelFilter::Debug);
        #[cfg(not(debug_assertions))]
        let default_log_levels = (log::LevelFilter::Warn, log::LevelFilter::Info);

        let app_crate = crate_name::<TCliArgs>();
        let mut log_builder = colog::basic_builder();
        log_builder
            .filter_level(default_log_levels.0)
            .filter_module(app_crate, default_log_levels.1);
        for workspace_crate in WORKSPACE_CRATES
        {
            log_builder.filter_module(workspace_crate, default_log_levels.1);
        }
        log_builder.parse_default_env().init();

        let app_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));

        let app_run = Self
        {
            app_name,
            version_str: app_version,
            start_time: chrono::Local::now(),
            args: TCliArgs::parse(),
            pid: std::process::id(),
            #[cfg(not(target_family="wasm"))]
            is_elevated: is_root::is_root(),
            #[cfg(target_family="wasm")]
            is_elevated: false,
            app_dir,
            exit_reason: AtomicI32::new(ExitReason::NormalExit as i32),
        };

        log::info!(target: app_crate,
            "=== Starting {} v{} [{}] (PID {}){} at {} ===",
            app_run.app_name,
            app_run.version_str,
            joined(" ", std::env::args()),
            app_run.pid,
            if app_run.is_elevated { " elevated" } else { "" },
            app_run.start_time);

        app_run
    }

    pub fn set_exit_reason(&self, exit_reason: ExitReason)
    {
        self.exit_reason.store(exit_reason as i32, Ordering::SeqCst);
    }
    pub fn get_exit_reason(&self) -> ExitReason
    {
        ExitReason::from_code(self.exit_reason.load(Ordering::SeqCst))
    }

    // Get the path to an app-specific folder
    pub fn get_app_folder(&self, folder: AppFolder) -> PathBuf
    {
        app_folder(self.app_name, &self.app_dir, folder)
    }
}
impl<TCliArgs: CliArgs> Drop for AppRun<TCliArgs>
{
    fn drop(&mut self)
    {
        log::info!(target: "app",
            "Exiting {} (PID {}) at {} with reason {:?}",
            self.app_name,
            self.pid,
            chrono::Local::now(),
            self.get_exit_reason());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitReason
{
    Unset = !1, // this should never be set
    NormalExit = 0,
    StartupFailure = 2,
    Panic = -99,
}
impl ExitReason
{
    fn from_code(code: i32) -> Self
    {
        match code
        {
            0 => Self::NormalExit,
            2 => Self::StartupFailure,
            -99 => Self::Panic,
            _ => Self::Unset,
        }
    }
}
impl std::process::Termination for ExitReason
{
    fn report(self) -> ExitCode
    {
        (self as u8).into()
    }
}

pub trait FatalErrorCode: Debug
{
    fn error_code(&self) -> u16;
}

#[derive(Clone, Copy)]
struct Panic<'p>(&'p PanicHookInfo<'p>);
impl FatalErrorCode for Panic<'_> { fn error_code(&self) -> u16 { 1u16 } }
impl Debug for Panic<'_>
{
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result
    {
        if let Some(payload_str) = self.0.payload().downcast_ref::<&str>()
        {
            f.write_fmt(format_args!("{payload_str}\n"))?;
        }
        else if let Some(payload_str) = self.0.payload().downcast_ref::<String>()
        {
            f.write_fmt(format_args!("{payload_str}\n"))?;
        }

        if let Some(location) = self.0.location()
        {
            Debug::fmt(&location, f)?
        }

        Ok(())
    }
}

pub fn set_panic_hook(wait_for_exit: bool)
{
    let default_panic_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic|
    {
        default_panic_hook(panic);

        if wait_for_exit
        {
            print!("Press any key to exit... ");
            let mut input = [0u8];
            let _ = std::io::stdin().read(&mut input);
        }

        fatal_error(FatalError::Panic, Panic(panic))
    }));
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FatalError
{
    Panic = 0,
}
impl FatalError
{
    pub fn short_name(&self) -> &'static str
    {
        match self
        {
            FatalError::Panic => "PNC",
        }
    }
}

// Exit the app with a fatal error
pub fn fatal_error(fatal_error: FatalError, code: impl FatalErrorCode) -> !
{
    let mut error_msg = format!("{}-{:04X}", fatal_error.short_name(), code.error_code());
    if cfg!(debug_assertions)
    {
        error_msg.push_str(&format!("\n\n{:#?}", &code));
    }

    eprintln!("!!! FATAL: {}", error_msg);

    eprintln!("Exiting (PID {}) at {} with reason {:?}",
              std::process::id(),
              chrono::Local::now(),
              ExitReason::Panic);

    std::process::exit(ExitReason::Panic as i32)
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn joined_args()
    {
        assert_eq!("", joined(" ", std::iter::empty::<&str>()));
        assert_eq!("a", joined(" ", ["a"].iter()));
        assert_eq!("a b c", joined(" ", ["a", "b", "c"].iter()));
    }

    #[test]
    fn exit_reason_codes()
    {
        for reason in [ExitReason::NormalExit, ExitReason::StartupFailure, ExitReason::Panic]
        {
            assert_eq!(reason, ExitReason::from_code(reason as i32));
        }
        assert_eq!(ExitReason::Unset, ExitReason::from_code(12345));
    }

    #[test]
    fn fatal_error_short_names()
    {
        assert_eq!("PNC", FatalError::Panic.short_name());
    }

    #[test]
    fn app_folders()
    {
        let app_dir = Path::new("/opt/kiln");
        assert_eq!(PathBuf::from("/opt/kiln/assets"), app_folder("Kiln Test", app_dir, AppFolder::Assets));

        let settings = app_folder("Kiln Test", app_dir, AppFolder::PerUserSettings);
        assert!(settings.is_absolute());
        assert_ne!(app_folder("Kiln Test", app_dir, AppFolder::Assets), settings);
    }

    #[test]
    fn crate_name_of_type()
    {
        assert_eq!("nab_kiln", crate_name::<AppFolder>());
        assert_eq!("u32", crate_name::<u32>());
    }
}

use anyhow::Result;
use std::ffi::OsString;
use std::path::PathBuf;
use tracegraph_engine::EngineConfig;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayArgs {
    pub graph: PathBuf,
    pub live: Option<PathBuf>,
    pub ghost: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub live_step_ms: Option<u64>,
    pub looping: bool,
    pub realtime: bool,
    pub mute: bool,
    pub until_ms: Option<u64>,
}

/// Upper bound on simulated time when a looping channel never goes idle.
pub const DEFAULT_LOOP_HORIZON_MS: u64 = 30_000;

impl ReplayArgs {
    pub fn apply_to(&self, cfg: &mut EngineConfig) {
        if let Some(ms) = self.live_step_ms {
            cfg.playback.live_step_ms = ms;
        }
        if self.looping {
            cfg.playback.loop_live = true;
            cfg.playback.loop_ghost = true;
        }
        if self.mute {
            cfg.audio.enabled = false;
        }
    }

    pub fn horizon_ms(&self, cfg: &EngineConfig) -> Option<u64> {
        self.until_ms.or_else(|| {
            (cfg.playback.loop_live || cfg.playback.loop_ghost).then_some(DEFAULT_LOOP_HORIZON_MS)
        })
    }
}

pub fn parse_args() -> Result<ReplayArgs> {
    parse_args_from(std::env::args_os().skip(1))
}

fn parse_args_from<I>(args: I) -> Result<ReplayArgs>
where
    I: IntoIterator<Item = OsString>,
{
    let mut out = ReplayArgs::default();
    let mut graph = None;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        if arg == "--graph" {
            let Some(path) = args.next() else {
                anyhow::bail!("--graph expects a path");
            };
            graph = Some(PathBuf::from(path));
        } else if arg == "--live" {
            let Some(path) = args.next() else {
                anyhow::bail!("--live expects a path");
            };
            out.live = Some(PathBuf::from(path));
        } else if arg == "--ghost" {
            let Some(path) = args.next() else {
                anyhow::bail!("--ghost expects a path");
            };
            out.ghost = Some(PathBuf::from(path));
        } else if arg == "--config" {
            let Some(path) = args.next() else {
                anyhow::bail!("--config expects a path");
            };
            out.config = Some(PathBuf::from(path));
        } else if arg == "--live-step-ms" {
            out.live_step_ms = Some(parse_ms(args.next(), "--live-step-ms")?);
        } else if arg == "--until-ms" {
            out.until_ms = Some(parse_ms(args.next(), "--until-ms")?);
        } else if arg == "--loop" {
            out.looping = true;
        } else if arg == "--realtime" {
            out.realtime = true;
        } else if arg == "--mute" {
            out.mute = true;
        } else {
            anyhow::bail!("unknown argument: {:?}", arg);
        }
    }

    let Some(graph) = graph else {
        anyhow::bail!("--graph is required");
    };
    out.graph = graph;
    Ok(out)
}

fn parse_ms(value: Option<OsString>, flag: &str) -> Result<u64> {
    let Some(value) = value else {
        anyhow::bail!("{flag} expects a number of milliseconds");
    };
    let value = value.to_string_lossy();
    value
        .parse::<u64>()
        .map_err(|_| anyhow::anyhow!("invalid value for {flag}: {value}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn os(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn parses_paths_and_flags() {
        let args = parse_args_from(os(&[
            "--graph", "g.json", "--ghost", "best.json", "--live-step-ms", "250", "--loop", "--mute",
        ]))
        .expect("args parsed");
        assert_eq!(args.graph, PathBuf::from("g.json"));
        assert_eq!(args.ghost, Some(PathBuf::from("best.json")));
        assert!(args.live.is_none());
        assert_eq!(args.live_step_ms, Some(250));
        assert!(args.looping && args.mute && !args.realtime);
    }

    #[test]
    fn graph_is_required() {
        assert!(parse_args_from(os(&["--live", "t.json"])).is_err());
    }

    #[test]
    fn rejects_bad_numbers_and_unknown_flags() {
        assert!(parse_args_from(os(&["--graph", "g", "--until-ms", "soon"])).is_err());
        assert!(parse_args_from(os(&["--graph", "g", "--fast"])).is_err());
    }

    #[test]
    fn overrides_land_in_config() {
        let args = parse_args_from(os(&["--graph", "g", "--loop", "--live-step-ms", "100"]))
            .expect("args parsed");
        let mut cfg = EngineConfig::default();
        args.apply_to(&mut cfg);
        assert_eq!(cfg.playback.live_step_ms, 100);
        assert!(cfg.playback.loop_ghost);
        assert_eq!(args.horizon_ms(&cfg), Some(DEFAULT_LOOP_HORIZON_MS));
        assert_eq!(args.horizon_ms(&EngineConfig::default()), None);
    }
}

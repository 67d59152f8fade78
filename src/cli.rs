use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Map file: JSON `{ "rows": [...] }` or battle XML with `<MAP v="..."/>` rows
    pub map: PathBuf,
    /// Battle file: JSON `{ "positions": [...], "objects": [...] }` or `<BATTLE>` XML
    #[arg(long)]
    pub battle: Option<PathBuf>,
    /// Token sprite map (`token_sprite_map.json`)
    #[arg(long)]
    pub token_map: Option<PathBuf>,
    /// Assets config overriding sprite paths and default sprites
    #[arg(long)]
    pub assets: Option<PathBuf>,
    /// Settings file holding the local tokenProps / tokenVisual overrides
    #[arg(long, default_value = "hexmap_settings.json")]
    pub settings: PathBuf,
    /// Local passability edit, e.g. `--passable A=false` (repeatable)
    #[arg(long = "passable", value_parser = parse_passable)]
    pub passable: Vec<(char, bool)>,
    /// Select a cell, e.g. `--select 14,11`
    #[arg(long, value_parser = parse_coord)]
    pub select: Option<(i32, i32)>,
    /// Output directory
    #[arg(long, default_value = "out")]
    pub output: PathBuf,
}

fn parse_passable(s: &str) -> Result<(char, bool), String> {
    let (tok, val) = s
        .split_once('=')
        .ok_or_else(|| format!("expected TOKEN=true|false, got `{s}`"))?;
    let mut chars = tok.chars();
    let token = match (chars.next(), chars.next()) {
        (Some(c), None) => c,
        _ => return Err(format!("token must be a single character, got `{tok}`")),
    };
    let passable = val
        .parse::<bool>()
        .map_err(|e| format!("bad passable value `{val}`: {e}"))?;
    Ok((token, passable))
}

fn parse_coord(s: &str) -> Result<(i32, i32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got `{s}`"))?;
    let x = x.trim().parse().map_err(|e| format!("bad x `{x}`: {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad y `{y}`: {e}"))?;
    Ok((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_passable_edits() {
        assert_eq!(parse_passable("A=false"), Ok(('A', false)));
        assert_eq!(parse_passable("0=true"), Ok(('0', true)));
        assert!(parse_passable("AB=true").is_err());
        assert!(parse_passable("A").is_err());
        assert!(parse_passable("A=maybe").is_err());
    }

    #[test]
    fn parses_selection() {
        assert_eq!(parse_coord("14,11"), Ok((14, 11)));
        assert_eq!(parse_coord(" 3 , 4"), Ok((3, 4)));
        assert!(parse_coord("3").is_err());
    }

    #[test]
    fn cli_accepts_full_invocation() {
        let cli = Cli::try_parse_from([
            "wg-hexmap",
            "map.xml",
            "--battle",
            "battle.xml",
            "--passable",
            "A=false",
            "--passable",
            "Q=true",
            "--select",
            "1,1",
        ])
        .expect("valid args");
        assert_eq!(cli.passable, vec![('A', false), ('Q', true)]);
        assert_eq!(cli.select, Some((1, 1)));
        assert_eq!(cli.output, PathBuf::from("out"));
    }
}

//! Command palette entries and autocomplete.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
  Overview,
  Anomalies,
  Clusters,
  Hotspots,
  Protocols,
  ClearCache,
  Quit,
}

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
  pub kind: CommandKind,
}

pub const COMMANDS: &[Command] = &[
  Command {
    name: "overview",
    aliases: &["o", "home", "dashboard"],
    description: "Summary of every analysis",
    kind: CommandKind::Overview,
  },
  Command {
    name: "anomalies",
    aliases: &["a", "anomaly"],
    description: "Anomalous packets",
    kind: CommandKind::Anomalies,
  },
  Command {
    name: "clusters",
    aliases: &["c", "cluster"],
    description: "Traffic clusters",
    kind: CommandKind::Clusters,
  },
  Command {
    name: "hotspots",
    aliases: &["h", "hotspot", "top"],
    description: "Busiest hosts and protocols",
    kind: CommandKind::Hotspots,
  },
  Command {
    name: "protocols",
    aliases: &["p", "protocol", "predict"],
    description: "Protocol predictions",
    kind: CommandKind::Protocols,
  },
  Command {
    name: "clear",
    aliases: &["clear-cache", "flush"],
    description: "Empty the response cache",
    kind: CommandKind::ClearCache,
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit netdash",
    kind: CommandKind::Quit,
  },
];

/// Resolve typed input to a command, by name or alias.
pub fn find(input: &str) -> Option<&'static Command> {
  let input = input.trim().to_lowercase();
  COMMANDS
    .iter()
    .find(|cmd| cmd.name == input || cmd.aliases.contains(&input.as_str()))
}

/// Commands matching `input`, best match first.
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input = input.trim().to_lowercase();
  if input.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut ranked: Vec<(&Command, u8)> = COMMANDS
    .iter()
    .filter_map(|cmd| rank(cmd, &input).map(|r| (cmd, r)))
    .collect();

  // Stable, so equal ranks keep palette order
  ranked.sort_by_key(|(_, r)| *r);
  ranked.into_iter().map(|(cmd, _)| cmd).collect()
}

fn rank(cmd: &Command, input: &str) -> Option<u8> {
  if cmd.name == input {
    Some(0)
  } else if cmd.aliases.contains(&input) {
    Some(1)
  } else if cmd.name.starts_with(input) {
    Some(2)
  } else if cmd.aliases.iter().any(|a| a.starts_with(input)) {
    Some(3)
  } else if cmd.name.contains(input) {
    Some(4)
  } else if cmd.aliases.iter().any(|a| a.contains(input)) {
    Some(5)
  } else {
    None
  }
}

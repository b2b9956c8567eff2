use std::str::FromStr;

use anyhow::{anyhow, bail};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Name(String),
    Address(String),
    City(String),
    Region(String),
    PostalCode(String),
    /// Geocode and save the location
    Submit,
    /// Change the search radius
    Radius(f64),
    /// Watch the nearby feed
    Observe,
    /// Go back to editing, closes the feed
    Edit,
    /// Print the location
    Show,
    /// Print the nearby locations
    Nearby,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  name <text>      set the location name
  address <text>   set the street address
  city <text>      set the city
  region <text>    set the state or province
  postal <text>    set the postal code
  submit           geocode and save the location
  radius <n>       change the nearby search radius
  observe          watch nearby locations
  edit             stop watching and edit the form
  show             print the location
  nearby           print nearby locations
  help             show this message
  quit             exit";

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim().to_string();

        let cmd = match word.to_ascii_lowercase().as_str() {
            "name" => Self::Name(rest),
            "address" => Self::Address(rest),
            "city" => Self::City(rest),
            "region" | "state" | "province" => Self::Region(rest),
            "postal" | "zip" => Self::PostalCode(rest),
            "submit" => Self::Submit,
            "radius" | "distance" => {
                let value = rest
                    .parse::<f64>()
                    .map_err(|_| anyhow!("Radius must be a number, got {rest:?}"))?;
                Self::Radius(value)
            }
            "observe" => Self::Observe,
            "edit" => Self::Edit,
            "show" => Self::Show,
            "nearby" => Self::Nearby,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            "" => bail!("Empty command"),
            other => bail!("Unknown command {other:?}, try \"help\""),
        };

        Ok(cmd)
    }
}

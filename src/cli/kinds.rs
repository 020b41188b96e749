use anyhow::Result;
use clap::Args;

use crate::console::Screen;

/// List the dialog kinds a screen accepts
#[derive(Debug, Args)]
pub struct KindsCommand {
    /// Screen to describe
    #[arg(value_enum)]
    pub screen: Screen,

    /// Print as a JSON array
    #[arg(long)]
    pub json: bool,
}

impl KindsCommand {
    pub fn execute(&self) -> Result<()> {
        let names = self.screen.dialog_names();
        if self.json {
            println!("{}", serde_json::to_string(&names)?);
        } else {
            for name in names {
                println!("{}", name);
            }
        }
        Ok(())
    }
}

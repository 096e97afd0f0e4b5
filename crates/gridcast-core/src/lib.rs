// Library root: fantasy football history datasets.
//
// Raw per-season sheets go in; supervised datasets pairing a season's fantasy
// output with the player's previous seasons of statistics come out.

pub mod clean;
pub mod combine;
pub mod csv_io;
pub mod dataset;
pub mod dedupe;
pub mod history;
pub mod merge;
pub mod names;
pub mod pipeline;
pub mod roster;
pub mod schema;
pub mod split;
pub mod table;
pub mod teams;

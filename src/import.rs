use crate::error::{Result, StatsError};
use crate::event_log::{EventLog, WordEvent};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Reads `text,start_time,end_time` rows (with header) into events.
///
/// Every row must be a valid event and start no earlier than the row before.
pub fn read_events<R: Read>(reader: R) -> Result<Vec<WordEvent>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut events: Vec<WordEvent> = Vec::new();

    for (row, record) in rdr.deserialize::<WordEvent>().enumerate() {
        let event = record?;
        let checked = match events.last() {
            Some(previous) => event.validate().and_then(|_| event.validate_after(previous)),
            None => event.validate(),
        };
        checked.map_err(|e| match e {
            // header is line 1
            StatsError::InvalidEvent(reason) => {
                StatsError::InvalidEvent(format!("line {}: {}", row + 2, reason))
            }
            other => other,
        })?;
        events.push(event);
    }

    Ok(events)
}

pub fn read_events_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<WordEvent>> {
    read_events(File::open(path)?)
}

/// Writes the log as `text,start_time,end_time` rows with a header.
pub fn write_events<W: Write>(writer: W, log: &EventLog) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for event in log.iter() {
        wtr.serialize(event)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_events_to_path<P: AsRef<Path>>(path: P, log: &EventLog) -> Result<()> {
    write_events(File::create(path)?, log)
}

//! GPX export of a ride's history.
//!
//! One `trkpt` per history record. Power goes in a plain `<power>`
//! extension, heart rate and cadence in the Garmin TrackPointExtension.

use crate::recording::types::ExportError;
use crate::simulation::HistoryRecord;
use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

const NS_GPX: &str = "http://www.topografix.com/GPX/1/1";
const NS_GPXTPX: &str = "http://www.garmin.com/xmlschemas/TrackPointExtension/v1";
const NS_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
const SCHEMA_LOCATION: &str =
    "http://www.topografix.com/GPX/1/1 http://www.topografix.com/GPX/1/1/gpx.xsd";
const CREATOR: &str = "PedalSim";

fn xml_err(e: impl std::fmt::Display) -> ExportError {
    ExportError::XmlError(e.to_string())
}

fn timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Export a ride's history as a GPX 1.1 document.
pub fn export_gpx(name: &str, history: &[HistoryRecord]) -> Result<String, ExportError> {
    let first = history.first().ok_or(ExportError::NoData)?;

    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_err)?;

    let mut root = BytesStart::new("gpx");
    root.push_attribute(("version", "1.1"));
    root.push_attribute(("creator", CREATOR));
    root.push_attribute(("xmlns", NS_GPX));
    root.push_attribute(("xmlns:gpxtpx", NS_GPXTPX));
    root.push_attribute(("xmlns:xsi", NS_XSI));
    root.push_attribute(("xsi:schemaLocation", SCHEMA_LOCATION));
    writer.write_event(Event::Start(root)).map_err(xml_err)?;

    writer
        .write_event(Event::Start(BytesStart::new("metadata")))
        .map_err(xml_err)?;
    write_element(&mut writer, "time", &timestamp(&first.time))?;
    writer
        .write_event(Event::End(BytesEnd::new("metadata")))
        .map_err(xml_err)?;

    writer
        .write_event(Event::Start(BytesStart::new("trk")))
        .map_err(xml_err)?;
    write_element(&mut writer, "name", name)?;
    write_element(&mut writer, "type", "VirtualRide")?;

    writer
        .write_event(Event::Start(BytesStart::new("trkseg")))
        .map_err(xml_err)?;
    for record in history {
        write_trackpoint(&mut writer, record)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("trkseg")))
        .map_err(xml_err)?;

    writer
        .write_event(Event::End(BytesEnd::new("trk")))
        .map_err(xml_err)?;
    writer
        .write_event(Event::End(BytesEnd::new("gpx")))
        .map_err(xml_err)?;

    let result = writer.into_inner().into_inner();
    String::from_utf8(result).map_err(xml_err)
}

fn write_trackpoint<W: std::io::Write>(
    writer: &mut Writer<W>,
    record: &HistoryRecord,
) -> Result<(), ExportError> {
    let lat = record.location.lat.to_string();
    let lon = record.location.lng.to_string();
    let mut trkpt = BytesStart::new("trkpt");
    trkpt.push_attribute(("lat", lat.as_str()));
    trkpt.push_attribute(("lon", lon.as_str()));
    writer.write_event(Event::Start(trkpt)).map_err(xml_err)?;

    write_element(writer, "ele", &format!("{:.5}", record.elevation))?;
    write_element(writer, "time", &timestamp(&record.time))?;
    write_extensions(writer, record)?;

    writer
        .write_event(Event::End(BytesEnd::new("trkpt")))
        .map_err(xml_err)?;
    Ok(())
}

fn write_extensions<W: std::io::Write>(
    writer: &mut Writer<W>,
    record: &HistoryRecord,
) -> Result<(), ExportError> {
    writer
        .write_event(Event::Start(BytesStart::new("extensions")))
        .map_err(xml_err)?;

    write_element(writer, "power", &format!("{:.0}", record.power))?;

    if record.heart_rate.is_some() || record.cadence.is_some() {
        writer
            .write_event(Event::Start(BytesStart::new("gpxtpx:TrackPointExtension")))
            .map_err(xml_err)?;
        if let Some(hr) = record.heart_rate {
            write_element(writer, "gpxtpx:hr", &format!("{:.0}", hr))?;
        }
        if let Some(cad) = record.cadence {
            write_element(writer, "gpxtpx:cad", &format!("{:.0}", cad))?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("gpxtpx:TrackPointExtension")))
            .map_err(xml_err)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("extensions")))
        .map_err(xml_err)?;
    Ok(())
}

fn write_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &str,
) -> Result<(), ExportError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(xml_err)?;
    writer
        .write_event(Event::Text(BytesText::new(value)))
        .map_err(xml_err)?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_err)?;
    Ok(())
}

/// Export to GPX and write the document to `path`.
pub fn export_gpx_to_file(
    name: &str,
    history: &[HistoryRecord],
    path: &std::path::Path,
) -> Result<(), ExportError> {
    let content = export_gpx(name, history)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Default filename for an export, from the first record's time.
pub fn generate_gpx_filename(history: &[HistoryRecord]) -> String {
    let started = history.first().map_or_else(Utc::now, |r| r.time);
    format!("PedalSim_{}.gpx", started.format("%Y%m%d_%H%M%S"))
}

//! iCalendar event extraction from REPORT responses.
//!
//! Each multistatus record carrying a `calendar-data` property is parsed as
//! an iCalendar document and its first VEVENT becomes an [`Event`]. One
//! corrupt payload never takes down the batch: the record is logged and
//! skipped, and extraction continues with the rest.
//!
//! Parsing uses the `icalendar` crate at the parser level (`unfold` +
//! `read_calendar`) rather than the high-level component API, because the
//! extraction contract needs raw TZID parameters, VALARM sub-components,
//! and undecomposed RRULE text.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use icalendar::parser::{Component, Property, read_calendar, unfold};
use icalendar::{CalendarDateTime, DatePerhapsTime};
use tracing::{debug, warn};
use url::Url;

use caldiff_core::{Alarm, Event, Frequency, RecurrenceRule};

use crate::error::DecodeResult;
use crate::href::resolve_href;
use crate::multistatus::decode_multistatus;

/// Summary used when the server omits or blanks SUMMARY.
const NO_TITLE: &str = "(No title)";

/// Extracts events from a calendar-query/multiget multistatus body.
///
/// Output order follows the order of response records in the input. Records
/// without `calendar-data` are ignored; records whose payload fails to parse
/// are logged with their href and skipped.
pub fn extract_events(xml: &str, base_url: Option<&Url>) -> DecodeResult<Vec<Event>> {
    let records = decode_multistatus(xml)?;

    let mut events = Vec::new();
    for record in &records {
        let Some(raw) = record.find_prop("calendar-data").map(|node| node.text()) else {
            continue;
        };
        if raw.is_empty() {
            continue;
        }

        let etag = record
            .find_prop("getetag")
            .map(|node| node.text().trim_matches('"').to_string())
            .unwrap_or_default();
        let href = resolve_href(base_url, &record.href);

        let normalized = normalize_line_endings(raw);
        match parse_vevent(&normalized, href, etag) {
            Ok(Some(event)) => events.push(event),
            Ok(None) => {
                debug!(href = %record.href, "calendar-data has no VEVENT, skipping record");
            }
            Err(error) => {
                warn!(href = %record.href, error = %error, "failed to parse calendar-data, skipping record");
            }
        }
    }

    Ok(events)
}

/// Restores CRLF line endings in embedded iCalendar text.
///
/// Some servers double-escape line endings when wrapping iCalendar text in
/// XML; after XML unescaping that leaves a literal `&#13;` or a lone CR.
fn normalize_line_endings(raw: &str) -> String {
    let expanded = raw.replace("&#13;\n", "\r\n").replace("&#13;", "\r\n");

    let mut out = String::with_capacity(expanded.len());
    let mut chars = expanded.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\r' && chars.peek() != Some(&'\n') {
            out.push_str("\r\n");
        } else {
            out.push(c);
        }
    }
    out
}

/// Parses one iCalendar document into an event.
///
/// `Ok(None)` means the document holds no VEVENT (e.g. a VTODO returned by
/// a permissive server) and the record should be skipped without noise.
fn parse_vevent(text: &str, href: String, etag: String) -> Result<Option<Event>, String> {
    let unfolded = unfold(text);
    let calendar = read_calendar(&unfolded)?;

    let Some(vevent) = calendar.components.iter().find(|c| c.name == "VEVENT") else {
        return Ok(None);
    };

    let uid = vevent
        .find_prop("UID")
        .ok_or("VEVENT is missing a UID")?
        .val
        .to_string();

    let summary = vevent
        .find_prop("SUMMARY")
        .map(|p| p.val.to_string())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| NO_TITLE.to_string());

    let start_prop = vevent.find_prop("DTSTART").ok_or("VEVENT is missing DTSTART")?;
    let start_value =
        DatePerhapsTime::try_from(start_prop).map_err(|_| "unparseable DTSTART value")?;
    let whole_day = matches!(start_value, DatePerhapsTime::Date(_));
    let start = to_naive(start_value);

    let end_prop = vevent.find_prop("DTEND");
    let end = match end_prop {
        Some(p) => {
            let raw_end =
                to_naive(DatePerhapsTime::try_from(p).map_err(|_| "unparseable DTEND value")?);
            if whole_day {
                // iCalendar stores a whole-day DTEND exclusively, one day
                // past the last full day; report the inclusive last day.
                raw_end - Duration::days(1)
            } else {
                raw_end
            }
        }
        None => start,
    };

    let alarms = vevent
        .components
        .iter()
        .filter(|c| c.name == "VALARM")
        .filter_map(parse_alarm)
        .collect();

    Ok(Some(Event {
        uid,
        summary,
        start,
        end,
        whole_day,
        description: vevent.find_prop("DESCRIPTION").map(|p| p.val.to_string()),
        location: vevent.find_prop("LOCATION").map(|p| p.val.to_string()),
        etag,
        href,
        recurrence_rule: vevent.find_prop("RRULE").map(|p| parse_rrule(p.val.as_ref())),
        start_tzid: tzid_param(start_prop),
        end_tzid: end_prop.and_then(tzid_param),
        alarms,
    }))
}

/// Converts a parsed date-or-datetime to a naive instant.
///
/// Date-only values become midnight. Timezone-qualified values keep their
/// local wall time; the raw TZID is recorded separately and never resolved.
fn to_naive(value: DatePerhapsTime) -> NaiveDateTime {
    match value {
        DatePerhapsTime::Date(date) => date.and_time(NaiveTime::MIN),
        DatePerhapsTime::DateTime(dt) => match dt {
            CalendarDateTime::Utc(dt) => dt.naive_utc(),
            CalendarDateTime::Floating(naive) => naive,
            CalendarDateTime::WithTimezone { date_time, .. } => date_time,
        },
    }
}

/// Reads a property's TZID parameter.
///
/// A (rare) multi-valued parameter contributes its first value only.
fn tzid_param(prop: &Property<'_>) -> Option<String> {
    prop.params
        .iter()
        .find(|p| p.key == "TZID")
        .and_then(|p| p.val.as_ref())
        .map(|v| v.as_ref().split(',').next().unwrap_or_default().trim().to_string())
        .filter(|tzid| !tzid.is_empty())
}

/// Decomposes an RRULE value.
///
/// Unrecognized FREQ values yield an absent frequency rather than a failure;
/// unknown keys are ignored.
fn parse_rrule(raw: &str) -> RecurrenceRule {
    let mut rule = RecurrenceRule {
        freq: None,
        interval: 1,
        count: None,
        until: None,
        by_day: None,
        by_month_day: None,
        by_month: None,
    };

    for part in raw.split(';') {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_ascii_uppercase().as_str() {
            "FREQ" => rule.freq = Frequency::from_rrule(value),
            "INTERVAL" => {
                if let Ok(interval) = value.parse::<u32>()
                    && interval > 0
                {
                    rule.interval = interval;
                }
            }
            "COUNT" => rule.count = value.parse().ok(),
            "UNTIL" => rule.until = parse_ical_datetime(value),
            "BYDAY" => {
                rule.by_day = Some(value.split(',').map(|d| d.trim().to_string()).collect());
            }
            "BYMONTHDAY" => {
                rule.by_month_day =
                    Some(value.split(',').filter_map(|d| d.trim().parse().ok()).collect());
            }
            "BYMONTH" => {
                rule.by_month =
                    Some(value.split(',').filter_map(|m| m.trim().parse().ok()).collect());
            }
            _ => {}
        }
    }

    rule
}

/// Parses an iCalendar datetime string.
///
/// Handles formats like:
/// - 20250205T100000Z (UTC)
/// - 20250205T100000 (local/naive)
/// - 20250205 (date only)
fn parse_ical_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    if s.len() == 8 && s.chars().all(|c| c.is_ascii_digit()) {
        return NaiveDate::parse_from_str(s, "%Y%m%d")
            .ok()
            .map(|d| d.and_time(NaiveTime::MIN));
    }

    NaiveDateTime::parse_from_str(s.trim_end_matches('Z'), "%Y%m%dT%H%M%S").ok()
}

/// Builds the tagged alarm variant for one VALARM.
///
/// An alarm without a TRIGGER is not actionable and is dropped without
/// logging. Unknown actions fall back to the display variant.
fn parse_alarm(alarm: &Component<'_>) -> Option<Alarm> {
    let trigger = alarm.find_prop("TRIGGER")?.val.to_string();
    let action = alarm
        .find_prop("ACTION")
        .map(|p| p.val.as_ref().to_ascii_uppercase())
        .unwrap_or_default();
    let description = alarm.find_prop("DESCRIPTION").map(|p| p.val.to_string());

    Some(match action.as_str() {
        "EMAIL" => Alarm::Email {
            trigger,
            description,
            summary: alarm.find_prop("SUMMARY").map(|p| p.val.to_string()),
            attendees: alarm
                .properties
                .iter()
                .filter(|p| p.name == "ATTENDEE")
                .map(|p| p.val.to_string())
                .collect(),
        },
        "AUDIO" => Alarm::Audio { trigger },
        _ => Alarm::Display { trigger, description },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Wraps ICS payloads in a multistatus REPORT response, one response
    /// record per payload, hrefs `/cal/ev0.ics`, `/cal/ev1.ics`, ...
    fn report(payloads: &[&str]) -> String {
        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<d:multistatus xmlns:d=\"DAV:\" xmlns:c=\"urn:ietf:params:xml:ns:caldav\">\n",
        );
        for (i, ics) in payloads.iter().enumerate() {
            xml.push_str(&format!(
                "<d:response>\n<d:href>/cal/ev{i}.ics</d:href>\n<d:propstat>\n<d:prop>\n<d:getetag>\"etag-{i}\"</d:getetag>\n<c:calendar-data>{ics}</c:calendar-data>\n</d:prop>\n<d:status>HTTP/1.1 200 OK</d:status>\n</d:propstat>\n</d:response>\n"
            ));
        }
        xml.push_str("</d:multistatus>");
        xml
    }

    fn vevent(body: &str) -> String {
        format!("BEGIN:VCALENDAR\nVERSION:2.0\nBEGIN:VEVENT\n{body}\nEND:VEVENT\nEND:VCALENDAR")
    }

    #[test]
    fn extracts_basic_event() {
        let ics = vevent(
            "UID:ev-1@example.com\nSUMMARY:Team Meeting\nDESCRIPTION:Weekly sync\nLOCATION:Room A\nDTSTART:20250205T100000Z\nDTEND:20250205T110000Z",
        );
        let events = extract_events(&report(&[&ics]), None).unwrap();

        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.uid, "ev-1@example.com");
        assert_eq!(event.summary, "Team Meeting");
        assert_eq!(event.description.as_deref(), Some("Weekly sync"));
        assert_eq!(event.location.as_deref(), Some("Room A"));
        assert_eq!(event.href, "/cal/ev0.ics");
        assert_eq!(event.etag, "etag-0");
        assert!(!event.whole_day);
        assert_eq!(event.start.to_string(), "2025-02-05 10:00:00");
        assert_eq!(event.end.to_string(), "2025-02-05 11:00:00");
        assert!(event.alarms.is_empty());
        assert!(event.recurrence_rule.is_none());
    }

    #[test]
    fn whole_day_end_is_inclusive() {
        let ics = vevent(
            "UID:wd-1\nSUMMARY:Offsite\nDTSTART;VALUE=DATE:20240110\nDTEND;VALUE=DATE:20240112",
        );
        let events = extract_events(&report(&[&ics]), None).unwrap();

        let event = &events[0];
        assert!(event.whole_day);
        assert_eq!(event.start.to_string(), "2024-01-10 00:00:00");
        // Exclusive DTEND minus one day: the last full day of the event.
        assert_eq!(event.end.to_string(), "2024-01-11 00:00:00");
    }

    #[test]
    fn missing_dtend_defaults_to_start() {
        let ics = vevent("UID:nd-1\nSUMMARY:Ping\nDTSTART:20250301T090000Z");
        let events = extract_events(&report(&[&ics]), None).unwrap();

        assert_eq!(events[0].start, events[0].end);
    }

    #[test]
    fn whole_day_without_dtend_is_not_adjusted() {
        let ics = vevent("UID:wd-2\nSUMMARY:Holiday\nDTSTART;VALUE=DATE:20240110");
        let events = extract_events(&report(&[&ics]), None).unwrap();

        assert!(events[0].whole_day);
        assert_eq!(events[0].end.to_string(), "2024-01-10 00:00:00");
    }

    #[test]
    fn blank_summary_gets_placeholder() {
        let ics = vevent("UID:bs-1\nDTSTART:20250301T090000Z\nDTEND:20250301T100000Z");
        let events = extract_events(&report(&[&ics]), None).unwrap();

        assert_eq!(events[0].summary, "(No title)");
    }

    #[test]
    fn tzid_read_per_boundary() {
        let ics = vevent(
            "UID:tz-1\nSUMMARY:Flight\nDTSTART;TZID=Europe/Paris:20250301T090000\nDTEND;TZID=America/New_York:20250301T120000",
        );
        let events = extract_events(&report(&[&ics]), None).unwrap();

        let event = &events[0];
        assert_eq!(event.start_tzid.as_deref(), Some("Europe/Paris"));
        assert_eq!(event.end_tzid.as_deref(), Some("America/New_York"));
    }

    #[test]
    fn multi_valued_tzid_takes_first() {
        let ics = vevent(
            "UID:tz-2\nSUMMARY:Odd\nDTSTART;TZID=Europe/Paris,Europe/Berlin:20250301T090000\nDTEND:20250301T100000Z",
        );
        let events = extract_events(&report(&[&ics]), None).unwrap();

        assert_eq!(events[0].start_tzid.as_deref(), Some("Europe/Paris"));
        assert_eq!(events[0].end_tzid, None);
    }

    #[test]
    fn rrule_is_decomposed() {
        let ics = vevent(
            "UID:rr-1\nSUMMARY:Sprint\nDTSTART:20250303T100000Z\nDTEND:20250303T110000Z\nRRULE:FREQ=WEEKLY;INTERVAL=2;COUNT=10;BYDAY=MO,WE;BYMONTH=3,4",
        );
        let events = extract_events(&report(&[&ics]), None).unwrap();

        let rule = events[0].recurrence_rule.as_ref().unwrap();
        assert_eq!(rule.freq, Some(Frequency::Weekly));
        assert_eq!(rule.interval, 2);
        assert_eq!(rule.count, Some(10));
        assert_eq!(rule.until, None);
        assert_eq!(
            rule.by_day.as_deref(),
            Some(&["MO".to_string(), "WE".to_string()][..])
        );
        assert_eq!(rule.by_month.as_deref(), Some(&[3, 4][..]));
        assert_eq!(rule.by_month_day, None);
    }

    #[test]
    fn rrule_until_and_unknown_freq() {
        let ics = vevent(
            "UID:rr-2\nSUMMARY:Odd\nDTSTART:20250303T100000Z\nDTEND:20250303T110000Z\nRRULE:FREQ=HOURLY;UNTIL=20250401T000000Z",
        );
        let events = extract_events(&report(&[&ics]), None).unwrap();

        let rule = events[0].recurrence_rule.as_ref().unwrap();
        assert_eq!(rule.freq, None);
        assert_eq!(rule.interval, 1);
        assert_eq!(rule.until.unwrap().to_string(), "2025-04-01 00:00:00");
    }

    #[test]
    fn email_alarm_collects_attendees_and_missing_trigger_drops() {
        let with_trigger = vevent(
            "UID:al-1\nSUMMARY:Review\nDTSTART:20250303T100000Z\nDTEND:20250303T110000Z\nBEGIN:VALARM\nACTION:EMAIL\nTRIGGER:-PT15M\nSUMMARY:Reminder\nATTENDEE:mailto:a@example.com\nATTENDEE:mailto:b@example.com\nEND:VALARM",
        );
        let without_trigger = vevent(
            "UID:al-2\nSUMMARY:Review\nDTSTART:20250303T100000Z\nDTEND:20250303T110000Z\nBEGIN:VALARM\nACTION:EMAIL\nSUMMARY:Reminder\nATTENDEE:mailto:a@example.com\nATTENDEE:mailto:b@example.com\nEND:VALARM",
        );
        let events = extract_events(&report(&[&with_trigger, &without_trigger]), None).unwrap();

        assert_eq!(events.len(), 2);
        match &events[0].alarms[..] {
            [Alarm::Email { trigger, summary, attendees, .. }] => {
                assert_eq!(trigger, "-PT15M");
                assert_eq!(summary.as_deref(), Some("Reminder"));
                assert_eq!(attendees.len(), 2);
            }
            other => panic!("expected one email alarm, got {other:?}"),
        }
        assert!(events[1].alarms.is_empty());
    }

    #[test]
    fn display_and_audio_alarms() {
        let ics = vevent(
            "UID:al-3\nSUMMARY:Mix\nDTSTART:20250303T100000Z\nDTEND:20250303T110000Z\nBEGIN:VALARM\nACTION:DISPLAY\nTRIGGER:-PT10M\nDESCRIPTION:Heads up\nEND:VALARM\nBEGIN:VALARM\nACTION:AUDIO\nTRIGGER:-PT5M\nEND:VALARM",
        );
        let events = extract_events(&report(&[&ics]), None).unwrap();

        assert_eq!(events[0].alarms.len(), 2);
        assert!(matches!(
            &events[0].alarms[0],
            Alarm::Display { trigger, description }
                if trigger == "-PT10M" && description.as_deref() == Some("Heads up")
        ));
        assert!(matches!(&events[0].alarms[1], Alarm::Audio { trigger } if trigger == "-PT5M"));
    }

    #[test]
    fn one_malformed_payload_does_not_poison_the_batch() {
        let good = vevent("UID:ok\nSUMMARY:Fine\nDTSTART:20250303T100000Z\nDTEND:20250303T110000Z");
        let mut payloads: Vec<String> = (0..9).map(|_| good.clone()).collect();
        payloads.insert(4, "BEGIN:VCALENDAR\nthis is not icalendar".to_string());
        let refs: Vec<&str> = payloads.iter().map(String::as_str).collect();

        let events = extract_events(&report(&refs), None).unwrap();
        assert_eq!(events.len(), 9);
    }

    #[test]
    fn vtodo_only_payload_is_skipped() {
        let todo = "BEGIN:VCALENDAR\nVERSION:2.0\nBEGIN:VTODO\nUID:task-1\nSUMMARY:Buy milk\nEND:VTODO\nEND:VCALENDAR";
        let good = vevent("UID:ok\nSUMMARY:Fine\nDTSTART:20250303T100000Z\nDTEND:20250303T110000Z");
        let events = extract_events(&report(&[todo, &good]), None).unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].uid, "ok");
    }

    #[test]
    fn carriage_return_entities_are_normalized() {
        // Lines joined by the CR entity only; after XML unescaping these are
        // lone CRs that must be widened to CRLF before iCalendar parsing.
        let ics = "BEGIN:VCALENDAR&#13;VERSION:2.0&#13;BEGIN:VEVENT&#13;UID:cr-1&#13;SUMMARY:Escaped&#13;DTSTART:20250303T100000Z&#13;DTEND:20250303T110000Z&#13;END:VEVENT&#13;END:VCALENDAR";
        let events = extract_events(&report(&[ics]), None).unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].uid, "cr-1");
        assert_eq!(events[0].summary, "Escaped");
    }

    #[test]
    fn href_resolution_and_etag_quotes() {
        let base = Url::parse("https://caldav.example.com/").unwrap();
        let ics = vevent("UID:hr-1\nSUMMARY:X\nDTSTART:20250303T100000Z\nDTEND:20250303T110000Z");
        let events = extract_events(&report(&[&ics]), Some(&base)).unwrap();

        assert_eq!(events[0].href, "https://caldav.example.com/cal/ev0.ics");
        assert_eq!(events[0].etag, "etag-0");
    }

    #[test]
    fn reparsing_identical_input_is_deterministic() {
        let ics = vevent(
            "UID:det-1\nSUMMARY:Same\nDTSTART;TZID=Europe/Paris:20250301T090000\nDTEND;TZID=Europe/Paris:20250301T100000\nRRULE:FREQ=DAILY;INTERVAL=3\nBEGIN:VALARM\nACTION:DISPLAY\nTRIGGER:-PT10M\nEND:VALARM",
        );
        let xml = report(&[&ics]);

        let first = extract_events(&xml, None).unwrap();
        let second = extract_events(&xml, None).unwrap();
        assert_eq!(first, second);
    }
}

//! CSV export of admission registrations.

use crate::core::registration::RegistrationRow;
use chrono::{FixedOffset, NaiveDate};

/// Column headers, in output order
pub const HEADERS: [&str; 16] = [
    "No. Pendaftaran",
    "Nama Siswa",
    "Email Siswa",
    "Telepon Siswa",
    "Nama Orang Tua",
    "Telepon Orang Tua",
    "Email Orang Tua",
    "Tanggal Lahir",
    "Tempat Lahir",
    "Jenis Kelamin",
    "Alamat",
    "Sekolah Asal",
    "Kompetensi Keahlian",
    "Status",
    "Catatan",
    "Tanggal Daftar",
];

/// Quotes a field when it contains a comma, quote, CR or LF (RFC 4180).
#[must_use]
pub fn escape_field(value: &str) -> String {
    if value.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn push_record<'a>(out: &mut String, fields: impl IntoIterator<Item = &'a str>) {
    let line = fields
        .into_iter()
        .map(escape_field)
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(&line);
    out.push_str("\r\n");
}

/// Renders registrations as CSV; submission times are shown in `timezone`.
#[must_use]
pub fn registrations_csv(rows: &[RegistrationRow], timezone: FixedOffset) -> String {
    let mut out = String::new();
    push_record(&mut out, HEADERS);

    for row in rows {
        let r = &row.registration;
        let birth_date = r.birth_date.format("%Y-%m-%d").to_string();
        let submitted = r
            .created_at
            .with_timezone(&timezone)
            .format("%Y-%m-%d %H:%M")
            .to_string();
        push_record(
            &mut out,
            [
                r.registration_number.as_str(),
                r.student_name.as_str(),
                r.student_email.as_str(),
                r.student_phone.as_str(),
                r.parent_name.as_str(),
                r.parent_phone.as_str(),
                r.parent_email.as_deref().unwrap_or(""),
                birth_date.as_str(),
                r.birth_place.as_str(),
                r.gender.code(),
                r.address.as_str(),
                r.previous_school.as_str(),
                row.skill_name.as_deref().unwrap_or(""),
                r.status.as_str(),
                r.notes.as_deref().unwrap_or(""),
                submitted.as_str(),
            ],
        );
    }
    out
}

/// `ppdb-registrations-YYYY-MM-DD.csv`
#[must_use]
pub fn export_filename(today: NaiveDate) -> String {
    format!("ppdb-registrations-{}.csv", today.format("%Y-%m-%d"))
}

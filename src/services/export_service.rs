use chrono::NaiveDate;

use crate::services::dashboard_service::RegistrationView;

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

const LIST_HEADER: [&str; 8] = [
    "Team Name",
    "Team Lead",
    "Email",
    "Phone",
    "College",
    "Team Size",
    "Registration Date",
    "Participants",
];

/// Every cell is quoted; embedded quotes are doubled.
pub fn csv_escape(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

fn csv_row<I, S>(cells: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    cells
        .into_iter()
        .map(|c| csv_escape(c.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn registrations_csv(registrations: &[RegistrationView]) -> String {
    let mut lines = Vec::with_capacity(registrations.len() + 1);
    lines.push(csv_row(LIST_HEADER));
    for reg in registrations {
        let participants = reg
            .participants
            .iter()
            .map(|p| format!("{} ({})", p.name, p.email))
            .collect::<Vec<_>>()
            .join("; ");
        let team_size = reg.team_size.to_string();
        lines.push(csv_row([
            reg.team_name.as_str(),
            reg.team_lead_name.as_str(),
            reg.team_lead_email.as_str(),
            reg.team_lead_phone.as_str(),
            reg.college_name.as_str(),
            team_size.as_str(),
            reg.created_label.as_str(),
            participants.as_str(),
        ]));
    }
    lines.join("\n")
}

pub fn registration_detail_csv(reg: &RegistrationView) -> String {
    let mut lines = vec![
        csv_row(["Field", "Value"]),
        csv_row(["Team Name", reg.team_name.as_str()]),
        csv_row(["Team Lead Name", reg.team_lead_name.as_str()]),
        csv_row(["Team Lead Email", reg.team_lead_email.as_str()]),
        csv_row(["Team Lead Phone", reg.team_lead_phone.as_str()]),
        csv_row(["College", reg.college_name.as_str()]),
        csv_row(["Registration Date", reg.created_label.as_str()]),
        csv_row(["Registration ID", reg.id.as_str()]),
        csv_row(["", ""]),
        csv_row(["Team Members", ""]),
    ];
    for (idx, p) in reg.participants.iter().enumerate() {
        lines.push(csv_row([
            format!("Member {}", idx + 1),
            format!("{} ({}) - {}", p.name, p.email, p.phone),
        ]));
    }
    lines.join("\n")
}

pub fn list_export_filename(today: NaiveDate) -> String {
    format!("ezhumi-hackathon-registrations-{}.csv", today.format("%Y-%m-%d"))
}

pub fn detail_export_filename(team_name: &str) -> String {
    let slug: String = team_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    format!("ezhumi-team-{}-details.csv", slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::participants_service::ParticipantView;

    fn view() -> RegistrationView {
        RegistrationView {
            id: "0b6d3f1e-1111-4222-8333-444455556666".into(),
            short_id: "0b6d3f1e".into(),
            team_name: "Green \"Sprout\"".into(),
            team_lead_name: "Anu".into(),
            team_lead_email: "anu@example.com".into(),
            team_lead_phone: "9876543210".into(),
            college_name: "REC, Chennai".into(),
            participants: vec![
                ParticipantView {
                    name: "Bala".into(),
                    email: "bala@example.com".into(),
                    phone: "9876500000".into(),
                },
                ParticipantView {
                    name: "Chitra".into(),
                    email: "N/A".into(),
                    phone: "N/A".into(),
                },
            ],
            team_size: 3,
            created_at: "2024-01-05T06:00:00Z".into(),
            created_label: "2024-01-05 11:30".into(),
            created_date: NaiveDate::from_ymd_opt(2024, 1, 5),
        }
    }

    #[test]
    fn escape_quotes_every_cell() {
        assert_eq!(csv_escape("plain"), "\"plain\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape(""), "\"\"");
    }

    #[test]
    fn list_export_layout() {
        let csv = registrations_csv(&[view()]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        let header: Vec<String> = LIST_HEADER.iter().map(|h| csv_escape(h)).collect();
        assert_eq!(lines[0], header.join(","));
        assert!(lines[0].starts_with("\"Team Name\",\"Team Lead\",\"Email\",\"Phone\""));
        assert!(lines[0].ends_with("\"Team Size\",\"Registration Date\",\"Participants\""));
        assert!(lines[1].starts_with("\"Green \"\"Sprout\"\"\",\"Anu\""));
        assert!(lines[1].contains("\"REC, Chennai\",\"3\""));
        assert!(lines[1].ends_with("\"Bala (bala@example.com); Chitra (N/A)\""));
    }

    #[test]
    fn empty_list_is_header_only() {
        assert_eq!(registrations_csv(&[]).lines().count(), 1);
    }

    #[test]
    fn detail_export_layout() {
        let reg = view();
        let csv = registration_detail_csv(&reg);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "\"Field\",\"Value\"");
        assert_eq!(lines[1], "\"Team Name\",\"Green \"\"Sprout\"\"\"");
        assert_eq!(lines[2], "\"Team Lead Name\",\"Anu\"");
        assert_eq!(lines[3], "\"Team Lead Email\",\"anu@example.com\"");
        assert!(lines[4].starts_with("\"Team Lead Phone\","));
        assert!(lines[5].starts_with("\"College\","));
        assert!(lines[6].starts_with("\"Registration Date\","));
        assert_eq!(lines[7], format!("\"Registration ID\",\"{}\"", reg.id));
        assert_eq!(lines[8], "\"\",\"\"");
        assert_eq!(lines[9], "\"Team Members\",\"\"");
        assert_eq!(lines[10], "\"Member 1\",\"Bala (bala@example.com) - 9876500000\"");
        assert_eq!(lines[11], "\"Member 2\",\"Chitra (N/A) - N/A\"");
        assert_eq!(lines.len(), 12);
        assert!(!csv.contains("Team Size"));
    }

    #[test]
    fn filenames() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(list_export_filename(day), "ezhumi-hackathon-registrations-2024-01-05.csv");
        assert_eq!(
            detail_export_filename("Green Sprout!"),
            "ezhumi-team-green_sprout_-details.csv"
        );
    }
}

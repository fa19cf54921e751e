#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TeamRegistrationRow {
    pub id: String,
    pub team_name: String,
    pub team_lead_name: String,
    pub team_lead_email: String,
    pub team_lead_phone: String,
    pub college_name: String,
    pub participant_count: i64,
    pub participants: Option<String>,
    pub registered_by: Option<String>,
    pub created_at: String,
}

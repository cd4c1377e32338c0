use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "processes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub number: String,
    pub complainant_id: Option<Uuid>,
    pub controller_id: Option<Uuid>,
    pub responsible_id: Option<Uuid>,
    pub entry_channel_id: Option<Uuid>,
    pub situation_id: Option<Uuid>,
    pub referral_id: Option<Uuid>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub received_at: Option<Date>,
    pub closed_at: Option<Date>,
    pub active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::responsibles::Entity",
        from = "Column::ResponsibleId",
        to = "super::responsibles::Column::Id"
    )]
    Responsible,
}

impl Related<super::responsibles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Responsible.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

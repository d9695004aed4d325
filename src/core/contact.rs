//! Contact entries shown on the public contact page.
//!
//! Entries are displayed in `order_index` order and at most one entry per
//! [`ContactType`] is primary. Multi-row writes run in one transaction.

use crate::{
    core::validation::{FieldCheck, MSG_EMAIL, MSG_PHONE, is_valid_contact_phone, is_valid_email},
    entities::{Contact, ContactType, contact},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::{info, instrument};

/// Values accepted when creating or editing a contact entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ContactInput {
    /// Kind of contact
    #[serde(rename = "type")]
    pub contact_type: ContactType,
    /// Display label
    pub label: String,
    /// Number, address, or URL
    pub value: String,
    /// Icon name
    #[serde(default)]
    pub icon: Option<String>,
    /// Make this the primary entry of its type
    #[serde(default)]
    pub is_primary: bool,
}

impl ContactInput {
    fn validate(&self) -> Result<()> {
        let mut check = FieldCheck::new();
        check.required("label", &self.label).required("value", &self.value);

        let value = self.value.trim();
        if !value.is_empty() {
            match self.contact_type {
                ContactType::Email if !is_valid_email(value) => {
                    check.fail("value", MSG_EMAIL);
                }
                ContactType::Phone if !is_valid_contact_phone(value) => {
                    check.fail("value", MSG_PHONE);
                }
                _ => {}
            }
        }
        check.finish()
    }

    fn icon(&self) -> Option<String> {
        self.icon
            .as_deref()
            .map(str::trim)
            .filter(|icon| !icon.is_empty())
            .map(str::to_string)
    }
}

/// All contacts in display order.
pub async fn list_contacts(db: &DatabaseConnection) -> Result<Vec<contact::Model>> {
    Contact::find()
        .order_by_asc(contact::Column::OrderIndex)
        .order_by_asc(contact::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a contact by id.
pub async fn get_contact<C>(db: &C, id: i64) -> Result<contact::Model>
where
    C: ConnectionTrait,
{
    Contact::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("contact", id))
}

/// Clears `is_primary` on every row of `contact_type` except `keep_id`.
async fn clear_primary<C>(db: &C, contact_type: ContactType, keep_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    Contact::update_many()
        .col_expr(contact::Column::IsPrimary, Expr::value(false))
        .filter(contact::Column::ContactType.eq(contact_type))
        .filter(contact::Column::Id.ne(keep_id))
        .filter(contact::Column::IsPrimary.eq(true))
        .exec(db)
        .await?;
    Ok(())
}

/// Creates a contact at the end of the list.
#[instrument(skip(db, input), fields(contact_type = ?input.contact_type))]
pub async fn create_contact(db: &DatabaseConnection, input: ContactInput) -> Result<contact::Model> {
    input.validate()?;
    let txn = db.begin().await?;

    let next_index = Contact::find()
        .order_by_desc(contact::Column::OrderIndex)
        .one(&txn)
        .await?
        .map_or(0, |last| last.order_index + 1);

    let created = contact::ActiveModel {
        contact_type: Set(input.contact_type),
        label: Set(input.label.trim().to_string()),
        value: Set(input.value.trim().to_string()),
        icon: Set(input.icon()),
        order_index: Set(next_index),
        is_primary: Set(input.is_primary),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    if created.is_primary {
        clear_primary(&txn, created.contact_type, created.id).await?;
    }
    txn.commit().await?;

    info!("Created contact {} at position {next_index}", created.id);
    Ok(created)
}

/// Replaces the editable fields of a contact; its position is kept.
#[instrument(skip(db, input))]
pub async fn update_contact(
    db: &DatabaseConnection,
    id: i64,
    input: ContactInput,
) -> Result<contact::Model> {
    input.validate()?;
    let txn = db.begin().await?;

    let mut model: contact::ActiveModel = get_contact(&txn, id).await?.into();
    model.contact_type = Set(input.contact_type);
    model.label = Set(input.label.trim().to_string());
    model.value = Set(input.value.trim().to_string());
    model.icon = Set(input.icon());
    model.is_primary = Set(input.is_primary);
    let updated = model.update(&txn).await?;

    if updated.is_primary {
        clear_primary(&txn, updated.contact_type, updated.id).await?;
    }
    txn.commit().await?;
    Ok(updated)
}

/// Deletes a contact.
#[instrument(skip(db))]
pub async fn delete_contact(db: &DatabaseConnection, id: i64) -> Result<()> {
    let result = Contact::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("contact", id));
    }
    info!("Deleted contact {id}");
    Ok(())
}

/// Sets or clears the primary flag of a contact.
///
/// Setting it clears the flag on every other contact of the same type in the
/// same transaction.
#[instrument(skip(db))]
pub async fn set_primary(db: &DatabaseConnection, id: i64, primary: bool) -> Result<contact::Model> {
    let txn = db.begin().await?;
    let contact = get_contact(&txn, id).await?;

    if primary {
        clear_primary(&txn, contact.contact_type, id).await?;
    }
    let mut model: contact::ActiveModel = contact.into();
    model.is_primary = Set(primary);
    let updated = model.update(&txn).await?;

    txn.commit().await?;
    info!("Contact {id} primary = {primary}");
    Ok(updated)
}

/// Assigns `order_index = position` to each id, in one transaction.
///
/// `ids` must list every contact exactly once. An unknown id fails with
/// [`Error::NotFound`], a partial or repeated list with [`Error::Validation`];
/// either way nothing changes.
#[instrument(skip(db))]
pub async fn reorder(db: &DatabaseConnection, ids: &[i64]) -> Result<Vec<contact::Model>> {
    let txn = db.begin().await?;

    let existing: BTreeSet<i64> = Contact::find()
        .select_only()
        .column(contact::Column::Id)
        .into_tuple::<i64>()
        .all(&txn)
        .await?
        .into_iter()
        .collect();
    if let Some(unknown) = ids.iter().find(|id| !existing.contains(id)) {
        return Err(Error::not_found("contact", *unknown));
    }
    let requested: BTreeSet<i64> = ids.iter().copied().collect();
    if requested.len() != ids.len() || requested != existing {
        return Err(Error::field("ids", "Urutan harus memuat semua kontak tepat satu kali"));
    }

    for (position, id) in ids.iter().enumerate() {
        let index = i32::try_from(position).map_err(|_| Error::field("ids", "Terlalu banyak data"))?;
        Contact::update_many()
            .col_expr(contact::Column::OrderIndex, Expr::value(index))
            .filter(contact::Column::Id.eq(*id))
            .exec(&txn)
            .await?;
    }
    txn.commit().await?;

    list_contacts(db).await
}

/// Drag-and-drop move: takes `dragged` out of the list and inserts it at the
/// position `target` currently occupies.
#[instrument(skip(db))]
pub async fn move_contact(
    db: &DatabaseConnection,
    dragged: i64,
    target: i64,
) -> Result<Vec<contact::Model>> {
    let mut ids: Vec<i64> = list_contacts(db).await?.into_iter().map(|c| c.id).collect();

    let from = ids
        .iter()
        .position(|id| *id == dragged)
        .ok_or_else(|| Error::not_found("contact", dragged))?;
    let to = ids
        .iter()
        .position(|id| *id == target)
        .ok_or_else(|| Error::not_found("contact", target))?;

    let moved = ids.remove(from);
    ids.insert(to, moved);
    reorder(db, &ids).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn ids(contacts: &[contact::Model]) -> Vec<i64> {
        contacts.iter().map(|c| c.id).collect()
    }

    #[tokio::test]
    async fn test_create_appends_and_trims() -> Result<()> {
        let db = setup_test_db().await?;
        let first = create_test_contact(&db, ContactType::Phone, "(021) 555-0101").await?;
        let second = create_contact(
            &db,
            ContactInput {
                contact_type: ContactType::Email,
                label: "  Humas ".to_string(),
                value: " humas@smk.example.sch.id ".to_string(),
                icon: Some("   ".to_string()),
                is_primary: false,
            },
        )
        .await?;

        assert_eq!(first.order_index, 0);
        assert_eq!(second.order_index, 1);
        assert_eq!(second.label, "Humas");
        assert_eq!(second.value, "humas@smk.example.sch.id");
        assert_eq!(second.icon, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_validation_depends_on_type() -> Result<()> {
        let db = setup_test_db().await?;
        let bad_email = ContactInput {
            contact_type: ContactType::Email,
            label: "Humas".to_string(),
            value: "humas-at-sekolah".to_string(),
            icon: None,
            is_primary: false,
        };
        let Err(Error::Validation { fields }) = create_contact(&db, bad_email).await else {
            panic!("expected validation error");
        };
        assert_eq!(fields["value"], MSG_EMAIL);

        let bad_phone = ContactInput {
            contact_type: ContactType::Phone,
            label: "TU".to_string(),
            value: "telp 0812".to_string(),
            icon: None,
            is_primary: false,
        };
        assert!(matches!(
            create_contact(&db, bad_phone).await,
            Err(Error::Validation { .. })
        ));

        // locations accept free text
        let location = ContactInput {
            contact_type: ContactType::Location,
            label: "Alamat".to_string(),
            value: "Jl. Pendidikan No. 1, Bandung".to_string(),
            icon: Some("map-pin".to_string()),
            is_primary: false,
        };
        assert!(create_contact(&db, location).await.is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn test_exactly_one_primary_per_type() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_test_contact(&db, ContactType::Phone, "0215550101").await?;
        let b = create_test_contact(&db, ContactType::Phone, "0215550102").await?;
        let c = create_test_contact(&db, ContactType::Phone, "0215550103").await?;
        let email = create_test_contact(&db, ContactType::Email, "tu@smk.example.sch.id").await?;

        set_primary(&db, email.id, true).await?;
        set_primary(&db, a.id, true).await?;
        set_primary(&db, c.id, true).await?;
        set_primary(&db, b.id, true).await?;

        let contacts = list_contacts(&db).await?;
        let primary_phones: Vec<_> = contacts
            .iter()
            .filter(|c| c.contact_type == ContactType::Phone && c.is_primary)
            .collect();
        assert_eq!(primary_phones.len(), 1);
        assert_eq!(primary_phones[0].id, b.id);
        // other types untouched
        assert!(contacts.iter().any(|c| c.id == email.id && c.is_primary));

        set_primary(&db, b.id, false).await?;
        assert!(list_contacts(&db).await?.iter().all(|c| c.contact_type != ContactType::Phone
            || !c.is_primary));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_to_primary_clears_others() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_test_contact(&db, ContactType::Phone, "0215550101").await?;
        let b = create_test_contact(&db, ContactType::Phone, "0215550102").await?;
        set_primary(&db, a.id, true).await?;

        let updated = update_contact(
            &db,
            b.id,
            ContactInput {
                contact_type: ContactType::Phone,
                label: "WhatsApp".to_string(),
                value: "+62 812 3456 7890".to_string(),
                icon: None,
                is_primary: true,
            },
        )
        .await?;
        assert!(updated.is_primary);
        assert_eq!(updated.order_index, b.order_index);
        assert!(!get_contact(&db, a.id).await?.is_primary);
        Ok(())
    }

    #[tokio::test]
    async fn test_move_contact() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_test_contact(&db, ContactType::Phone, "0215550101").await?;
        let b = create_test_contact(&db, ContactType::Phone, "0215550102").await?;
        let c = create_test_contact(&db, ContactType::Phone, "0215550103").await?;
        let d = create_test_contact(&db, ContactType::Phone, "0215550104").await?;

        // drag a down onto c
        let contacts = move_contact(&db, a.id, c.id).await?;
        assert_eq!(ids(&contacts), vec![b.id, c.id, a.id, d.id]);
        assert_eq!(
            contacts.iter().map(|c| c.order_index).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );

        // drag d up onto b
        let contacts = move_contact(&db, d.id, b.id).await?;
        assert_eq!(ids(&contacts), vec![d.id, b.id, c.id, a.id]);

        // dropping on itself changes nothing
        let contacts = move_contact(&db, c.id, c.id).await?;
        assert_eq!(ids(&contacts), vec![d.id, b.id, c.id, a.id]);
        Ok(())
    }

    #[tokio::test]
    async fn test_reorder_unknown_id_rolls_back() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_test_contact(&db, ContactType::Phone, "0215550101").await?;
        let b = create_test_contact(&db, ContactType::Phone, "0215550102").await?;

        let result = reorder(&db, &[b.id, 999, a.id]).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        assert_eq!(ids(&list_contacts(&db).await?), vec![a.id, b.id]);
        Ok(())
    }

    #[tokio::test]
    async fn test_reorder_requires_every_contact_once() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_test_contact(&db, ContactType::Phone, "0215550101").await?;
        let b = create_test_contact(&db, ContactType::Phone, "0215550102").await?;
        let c = create_test_contact(&db, ContactType::Phone, "0215550103").await?;

        for partial in [vec![c.id], vec![c.id, a.id, a.id]] {
            let Err(Error::Validation { fields }) = reorder(&db, &partial).await else {
                panic!("expected validation error for {partial:?}");
            };
            assert!(fields.contains_key("ids"));
        }
        let contacts = list_contacts(&db).await?;
        assert_eq!(ids(&contacts), vec![a.id, b.id, c.id]);
        assert_eq!(
            contacts.iter().map(|c| c.order_index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );

        let reordered = reorder(&db, &[c.id, a.id, b.id]).await?;
        assert_eq!(ids(&reordered), vec![c.id, a.id, b.id]);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_contact() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_test_contact(&db, ContactType::Social, "https://instagram.com/smk").await?;
        delete_contact(&db, a.id).await?;
        assert!(matches!(delete_contact(&db, a.id).await, Err(Error::NotFound { .. })));
        Ok(())
    }
}

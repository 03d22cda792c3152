use diesel::prelude::*;

use crate::errors::ServiceError;
use crate::models::{Contact, NewContact};
use crate::schema::contacts;

pub fn create_contact(conn: &mut PgConnection, new_contact: &NewContact) -> Result<Contact, ServiceError> {
    let contact = diesel::insert_into(contacts::table)
        .values(new_contact)
        .returning(Contact::as_returning())
        .get_result(conn)?;
    Ok(contact)
}

pub fn list_contacts(conn: &mut PgConnection) -> Result<Vec<Contact>, ServiceError> {
    let all = contacts::table
        .order((contacts::created_at.desc(), contacts::id.desc()))
        .select(Contact::as_select())
        .load(conn)?;
    Ok(all)
}

pub fn get_contact(conn: &mut PgConnection, contact_id: i32) -> Result<Contact, ServiceError> {
    contacts::table
        .find(contact_id)
        .select(Contact::as_select())
        .first(conn)
        .optional()?
        .ok_or(ServiceError::NotFound("Contact"))
}

pub fn set_read(conn: &mut PgConnection, contact_id: i32, is_read: bool) -> Result<Contact, ServiceError> {
    diesel::update(contacts::table.find(contact_id))
        .set(contacts::is_read.eq(is_read))
        .returning(Contact::as_returning())
        .get_result(conn)
        .optional()?
        .ok_or(ServiceError::NotFound("Contact"))
}

pub fn delete_contact(conn: &mut PgConnection, contact_id: i32) -> Result<(), ServiceError> {
    let deleted = diesel::delete(contacts::table.find(contact_id)).execute(conn)?;
    if deleted == 0 {
        return Err(ServiceError::NotFound("Contact"));
    }
    Ok(())
}

//! Diesel table definitions; keep in step with `backend/migrations`.

diesel::table! {
    /// Manufacturer accounts. `email`, `gov_code` and `license_number` are
    /// unique.
    manufacturers (id) {
        id -> Uuid,
        name -> Varchar,
        email -> Varchar,
        /// `pbkdf2_sha256$<iterations>$<salt>$<hash>`.
        password_hash -> Text,
        gov_code -> Varchar,
        phone -> Nullable<Varchar>,
        license_number -> Varchar,
        is_verified -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Registered drug batches keyed by their lookup identifier.
    drugs (identifier) {
        identifier -> Varchar,
        name -> Varchar,
        batch -> Varchar,
        manufacturer_id -> Uuid,
        expiry -> Date,
        verification_artifact -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(drugs -> manufacturers (manufacturer_id));
diesel::allow_tables_to_appear_in_same_query!(drugs, manufacturers);

diesel::table! {
    users (id) {
        id -> Uuid,
        role -> Text,
        full_name -> Text,
        email -> Text,
        mobile_number -> Nullable<Text>,
        address -> Nullable<Text>,
        vc_number -> Nullable<Text>,
        customer_id -> Nullable<Text>,
        assigned_to -> Nullable<Uuid>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    packages (id) {
        id -> Uuid,
        name -> Text,
        price -> Numeric,
        description -> Nullable<Text>,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    channels (id) {
        id -> Uuid,
        name -> Text,
        price -> Numeric,
        category -> Nullable<Text>,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    subscriptions (id) {
        id -> Uuid,
        user_id -> Uuid,
        package_id -> Uuid,
        status -> Text,
        next_billing_date -> Nullable<Date>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    subscription_addons (subscription_id, channel_id) {
        subscription_id -> Uuid,
        channel_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    payments (id) {
        id -> Uuid,
        user_id -> Uuid,
        amount -> Numeric,
        status -> Text,
        method -> Text,
        payment_date -> Nullable<Timestamptz>,
        billing_month -> Text,
        collected_by -> Nullable<Uuid>,
        package_name -> Nullable<Text>,
        addon_names -> Array<Text>,
        notes -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    invoices (id) {
        id -> Uuid,
        user_id -> Uuid,
        subscription_id -> Nullable<Uuid>,
        amount_due -> Numeric,
        amount_paid -> Numeric,
        status -> Text,
        issued_date -> Date,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    tickets (id) {
        id -> Uuid,
        customer_id -> Uuid,
        assigned_to -> Nullable<Uuid>,
        subject -> Text,
        description -> Text,
        priority -> Text,
        status -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(subscriptions -> users (user_id));
diesel::joinable!(subscriptions -> packages (package_id));
diesel::joinable!(subscription_addons -> subscriptions (subscription_id));
diesel::joinable!(subscription_addons -> channels (channel_id));
diesel::joinable!(invoices -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    packages,
    channels,
    subscriptions,
    subscription_addons,
    payments,
    invoices,
    tickets,
);

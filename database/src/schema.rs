// @generated manually to match the models in this crate.

diesel::table! {
    balances (user_id, asset_symbol) {
        #[max_length = 64]
        user_id -> Varchar,
        #[max_length = 20]
        asset_symbol -> Varchar,
        available -> Numeric,
        locked -> Numeric,
        update_time -> Int8,
    }
}

diesel::table! {
    orders (id) {
        id -> Int8,
        #[max_length = 64]
        user_id -> Varchar,
        #[max_length = 20]
        symbol -> Varchar,
        #[max_length = 4]
        side -> Varchar,
        price -> Numeric,
        amount -> Numeric,
        filled -> Numeric,
        #[max_length = 10]
        status -> Varchar,
        timestamp -> Int8,
        created_at -> Int8,
    }
}

diesel::table! {
    trades (id) {
        id -> Int8,
        #[max_length = 20]
        symbol -> Varchar,
        maker_order_id -> Int8,
        taker_order_id -> Int8,
        price -> Numeric,
        amount -> Numeric,
        created_at -> Int8,
    }
}

diesel::allow_tables_to_appear_in_same_query!(balances, orders, trades,);

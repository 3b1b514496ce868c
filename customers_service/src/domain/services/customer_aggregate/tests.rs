use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use chrono::{DateTime, Duration};
use cool_asserts::assert_matches;
use models_customers::{
    CustomerAttributes, CustomerValidationError, DataType, FieldSpec, FieldValueValidationError,
};
use serde_json::json;

use crate::{
    domain::{
        error::Resource,
        ports::{
            FieldRegistryService, MockCustomerCache, MockCustomerStorage,
            MockFieldRegistryStorage, MockFieldValueStore,
        },
        services::FieldRegistryImpl,
    },
    outbound::memory::InMemoryCustomerCache,
};

use super::*;

type TestAggregate = CustomerAggregateImpl<
    MockCustomerStorage,
    MockFieldValueStore,
    MockFieldRegistryStorage,
    MockCustomerCache,
>;

fn aggregate(
    customers: MockCustomerStorage,
    values: MockFieldValueStore,
    fields: MockFieldRegistryStorage,
    cache: MockCustomerCache,
) -> TestAggregate {
    CustomerAggregateImpl::new(customers, values, fields, cache)
}

fn field(name: &str, data_type: DataType, options: Option<Vec<&str>>) -> FieldDefinition {
    FieldDefinition::new(
        Uuid::now_v7(),
        FieldSpec {
            name: name.to_string(),
            data_type,
            options: options.map(|o| o.into_iter().map(String::from).collect()),
        },
        Utc::now(),
    )
}

fn fields_with(definitions: Vec<FieldDefinition>) -> MockFieldRegistryStorage {
    let mut fields = MockFieldRegistryStorage::new();
    fields.expect_list_fields().returning(move || {
        let definitions = definitions.clone();
        Box::pin(async move { Ok(definitions) })
    });
    fields
}

/// A cache that accepts writes and never serves reads
fn write_only_cache() -> MockCustomerCache {
    let mut cache = MockCustomerCache::new();
    cache.expect_put().return_const(());
    cache.expect_evict().return_const(());
    cache.expect_is_available().return_const(false);
    cache
}

fn customer(name: &str, created_at: DateTime<Utc>) -> Customer {
    Customer {
        id: Uuid::now_v7(),
        attributes: CustomerAttributes {
            name: name.to_string(),
            dob: None,
            phone: "555-0100".to_string(),
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            occupation: "Eng".to_string(),
            location: "NYC".to_string(),
        },
        created_at,
        updated_at: created_at,
    }
}

fn request(name: &str, custom_field_values: Vec<(String, Value)>) -> CustomerRequest {
    CustomerRequest {
        name: name.to_string(),
        phone: "555-0100".to_string(),
        email: "a@x.com".to_string(),
        occupation: "Eng".to_string(),
        location: "NYC".to_string(),
        custom_field_values: custom_field_values.into_iter().collect(),
        ..Default::default()
    }
}

fn echo_insert(customers: &mut MockCustomerStorage) {
    customers
        .expect_insert_customer()
        .times(1)
        .returning(|customer, values| Box::pin(async move { Ok((customer, values)) }));
}

#[tokio::test]
async fn it_should_create_with_typed_values_and_drop_orphans() {
    let notes = field("Notes", DataType::Text, None);
    let notes_id = notes.id;

    let mut customers = MockCustomerStorage::new();
    customers
        .expect_insert_customer()
        .withf(move |customer, values| {
            customer.attributes.name == "Ann"
                && values
                    == &vec![RawFieldValue {
                        field_id: notes_id,
                        value: "hello".to_string(),
                    }]
        })
        .times(1)
        .returning(|customer, values| Box::pin(async move { Ok((customer, values)) }));

    let record = aggregate(
        customers,
        MockFieldValueStore::new(),
        fields_with(vec![notes]),
        write_only_cache(),
    )
    .create(request(
        "Ann",
        vec![
            (notes_id.to_string(), json!("hello")),
            (Uuid::now_v7().to_string(), json!("x")),
            ("not-a-field-id".to_string(), json!("y")),
        ],
    ))
    .await
    .unwrap();

    assert_eq!(record.attributes.name, "Ann");
    assert_eq!(
        record.custom_field_values,
        BTreeMap::from([(notes_id, FieldValue::Text("hello".to_string()))])
    );
}

#[tokio::test]
async fn it_should_accept_listed_select_options() {
    let tier = field("Tier", DataType::Select, Some(vec!["Regular", "VIP"]));
    let tier_id = tier.id;

    let mut customers = MockCustomerStorage::new();
    echo_insert(&mut customers);

    let record = aggregate(
        customers,
        MockFieldValueStore::new(),
        fields_with(vec![tier]),
        write_only_cache(),
    )
    .create(request("Ann", vec![(tier_id.to_string(), json!("VIP"))]))
    .await
    .unwrap();

    assert_eq!(
        record.custom_field_values.get(&tier_id),
        Some(&FieldValue::Select("VIP".to_string()))
    );
}

#[tokio::test]
async fn it_should_reject_unlisted_select_options_before_writing() {
    let tier = field("Tier", DataType::Select, Some(vec!["Regular", "VIP"]));
    let tier_id = tier.id;

    let mut customers = MockCustomerStorage::new();
    customers.expect_insert_customer().never();

    let err = aggregate(
        customers,
        MockFieldValueStore::new(),
        fields_with(vec![tier]),
        MockCustomerCache::new(),
    )
    .create(request("Ann", vec![(tier_id.to_string(), json!("Platinum"))]))
    .await
    .unwrap_err();

    assert_matches!(
        err,
        CrmError::Validation(ValidationError::FieldValue {
            field_id,
            source: FieldValueValidationError::NotAnOption { value, .. },
        }) => {
            assert_eq!(field_id, tier_id);
            assert_eq!(value, "Platinum");
        }
    );
}

#[tokio::test]
async fn it_should_reject_a_missing_name_without_touching_storage() {
    let err = aggregate(
        MockCustomerStorage::new(),
        MockFieldValueStore::new(),
        MockFieldRegistryStorage::new(),
        MockCustomerCache::new(),
    )
    .create(request("  ", vec![]))
    .await
    .unwrap_err();

    assert_matches!(
        err,
        CrmError::Validation(ValidationError::Customer(CustomerValidationError::EmptyName))
    );
}

#[tokio::test]
async fn it_should_omit_blank_values() {
    let notes = field("Notes", DataType::Text, None);
    let notes_id = notes.id;

    let mut customers = MockCustomerStorage::new();
    customers
        .expect_insert_customer()
        .withf(|_, values| values.is_empty())
        .times(1)
        .returning(|customer, values| Box::pin(async move { Ok((customer, values)) }));

    let record = aggregate(
        customers,
        MockFieldValueStore::new(),
        fields_with(vec![notes]),
        write_only_cache(),
    )
    .create(request("Ann", vec![(notes_id.to_string(), json!(""))]))
    .await
    .unwrap();

    assert!(record.custom_field_values.is_empty());
}

#[tokio::test]
async fn it_should_surface_a_failed_write_as_one_storage_error() {
    let notes = field("Notes", DataType::Text, None);
    let notes_id = notes.id;

    let mut customers = MockCustomerStorage::new();
    customers
        .expect_insert_customer()
        .times(1)
        .returning(|_, _| Box::pin(async { Err(anyhow::anyhow!("value insert failed")) }));

    let mut cache = MockCustomerCache::new();
    cache.expect_put().never();

    let err = aggregate(
        customers,
        MockFieldValueStore::new(),
        fields_with(vec![notes]),
        cache,
    )
    .create(request("Ann", vec![(notes_id.to_string(), json!("hello"))]))
    .await
    .unwrap_err();

    assert_matches!(err, CrmError::Storage(_));
}

#[tokio::test]
async fn it_should_replace_all_values_on_update() {
    let notes = field("Notes", DataType::Text, None);
    let existing = customer("Ann", Utc::now());
    let id = existing.id;

    let mut customers = MockCustomerStorage::new();
    customers
        .expect_update_customer()
        .withf(move |requested, attributes, values| {
            *requested == id && attributes.name == "Ann Lee" && values.is_empty()
        })
        .times(1)
        .returning(move |_, attributes, values| {
            let mut updated = existing.clone();
            updated.attributes = attributes;
            Box::pin(async move { Ok(Some((updated, values))) })
        });

    let record = aggregate(
        customers,
        MockFieldValueStore::new(),
        fields_with(vec![notes]),
        write_only_cache(),
    )
    .update(id, request("Ann Lee", vec![]))
    .await
    .unwrap();

    assert_eq!(record.id, id);
    assert_eq!(record.attributes.name, "Ann Lee");
    assert!(record.custom_field_values.is_empty());
}

#[tokio::test]
async fn it_should_not_update_an_unknown_customer() {
    let id = Uuid::now_v7();
    let mut customers = MockCustomerStorage::new();
    customers
        .expect_update_customer()
        .returning(|_, _, _| Box::pin(async { Ok(None) }));

    let mut cache = MockCustomerCache::new();
    cache.expect_evict().withf(move |evicted| *evicted == id).times(1).return_const(());

    let err = aggregate(
        customers,
        MockFieldValueStore::new(),
        fields_with(vec![]),
        cache,
    )
    .update(id, request("Ann", vec![]))
    .await
    .unwrap_err();

    assert_matches!(
        err,
        CrmError::NotFound { resource: Resource::Customer, id: missing } => assert_eq!(missing, id)
    );
}

#[tokio::test]
async fn it_should_type_stored_values_and_skip_stale_ones() {
    let age = field("Age", DataType::Number, None);
    let vip = field("VIP", DataType::Boolean, None);
    let (age_id, vip_id) = (age.id, vip.id);
    let removed_id = Uuid::now_v7();
    let existing = customer("Ann", Utc::now());
    let id = existing.id;

    let mut customers = MockCustomerStorage::new();
    customers.expect_get_customer().times(1).returning(move |_| {
        let existing = existing.clone();
        Box::pin(async move { Ok(Some(existing)) })
    });

    let mut values = MockFieldValueStore::new();
    values
        .expect_get_values()
        .withf(move |customer_id| *customer_id == id)
        .times(1)
        .returning(move |_| {
            Box::pin(async move {
                Ok(vec![
                    // stored while Age was a text field
                    RawFieldValue {
                        field_id: age_id,
                        value: "hello".to_string(),
                    },
                    RawFieldValue {
                        field_id: vip_id,
                        value: "true".to_string(),
                    },
                    RawFieldValue {
                        field_id: removed_id,
                        value: "gone".to_string(),
                    },
                ])
            })
        });

    let record = aggregate(customers, values, fields_with(vec![age, vip]), write_only_cache())
        .get(id)
        .await
        .unwrap();

    assert_eq!(
        record.custom_field_values,
        BTreeMap::from([(vip_id, FieldValue::Boolean(true))])
    );
}

#[tokio::test]
async fn it_should_skip_selections_of_removed_options_so_they_can_be_echoed_back() {
    let tier = field("Tier", DataType::Select, Some(vec!["Gold"]));
    let tier_id = tier.id;
    let existing = customer("Ann", Utc::now());
    let id = existing.id;

    let mut customers = MockCustomerStorage::new();
    customers.expect_get_customer().times(1).returning(move |_| {
        let existing = existing.clone();
        Box::pin(async move { Ok(Some(existing)) })
    });
    customers
        .expect_update_customer()
        .withf(|_, _, values| values.is_empty())
        .times(1)
        .returning(|id, attributes, values| {
            let now = Utc::now();
            Box::pin(async move {
                Ok(Some((
                    Customer {
                        id,
                        attributes,
                        created_at: now,
                        updated_at: now,
                    },
                    values,
                )))
            })
        });

    let mut values = MockFieldValueStore::new();
    values.expect_get_values().times(1).returning(move |_| {
        Box::pin(async move {
            // chosen while VIP was still an option
            Ok(vec![RawFieldValue {
                field_id: tier_id,
                value: "VIP".to_string(),
            }])
        })
    });

    let service = aggregate(customers, values, fields_with(vec![tier]), write_only_cache());
    let record = service.get(id).await.unwrap();
    assert!(record.custom_field_values.is_empty());

    let echoed = record
        .custom_field_values
        .iter()
        .map(|(field_id, value)| (field_id.to_string(), serde_json::to_value(value).unwrap()))
        .collect();
    let updated = service.update(id, request("Ann", echoed)).await.unwrap();

    assert!(updated.custom_field_values.is_empty());
}

#[tokio::test]
async fn it_should_not_serve_values_of_a_removed_field_from_the_cache() {
    let tier = field("Tier", DataType::Select, Some(vec!["Regular", "VIP"]));
    let tier_id = tier.id;
    let existing = customer("Ann", Utc::now());
    let id = existing.id;
    let unreachable = Arc::new(AtomicBool::new(false));

    let mut customers = MockCustomerStorage::new();
    let storage_down = unreachable.clone();
    customers.expect_get_customer().returning(move |_| {
        let existing = existing.clone();
        let down = storage_down.load(Ordering::SeqCst);
        Box::pin(async move {
            if down {
                Err(anyhow::anyhow!("connection refused"))
            } else {
                Ok(Some(existing))
            }
        })
    });

    let mut values = MockFieldValueStore::new();
    values.expect_get_values().times(1).returning(move |_| {
        Box::pin(async move {
            Ok(vec![RawFieldValue {
                field_id: tier_id,
                value: "VIP".to_string(),
            }])
        })
    });

    let mut registry_storage = MockFieldRegistryStorage::new();
    registry_storage
        .expect_delete_field()
        .times(1)
        .returning(|_| Box::pin(async { Ok(true) }));

    let cache = InMemoryCustomerCache::new();
    let registry = FieldRegistryImpl::new(registry_storage, cache.clone());
    let service = CustomerAggregateImpl::new(customers, values, fields_with(vec![tier]), cache);

    let first = service.get(id).await.unwrap();
    assert_eq!(
        first.custom_field_values,
        BTreeMap::from([(tier_id, FieldValue::Select("VIP".to_string()))])
    );

    registry.remove(tier_id).await.unwrap();
    unreachable.store(true, Ordering::SeqCst);

    let fallback = service.get(id).await.unwrap();
    assert_eq!(fallback.id, id);
    assert!(fallback.custom_field_values.is_empty());
}

#[tokio::test]
async fn it_should_fall_back_to_the_cache_when_storage_fails() {
    let cached = CustomerRecord::assemble(customer("Ann", Utc::now()), BTreeMap::new());
    let id = cached.id;

    let mut customers = MockCustomerStorage::new();
    customers
        .expect_get_customer()
        .returning(|_| Box::pin(async { Err(anyhow::anyhow!("connection refused")) }));

    let mut cache = MockCustomerCache::new();
    cache.expect_is_available().return_const(true);
    let hit = cached.clone();
    cache
        .expect_get()
        .withf(move |requested| *requested == id)
        .times(1)
        .return_const(Some(hit));

    let record = aggregate(
        customers,
        MockFieldValueStore::new(),
        MockFieldRegistryStorage::new(),
        cache,
    )
    .get(id)
    .await
    .unwrap();

    assert_eq!(record, cached);
}

#[tokio::test]
async fn it_should_not_fall_back_when_the_cache_is_unavailable() {
    let mut customers = MockCustomerStorage::new();
    customers
        .expect_get_customer()
        .returning(|_| Box::pin(async { Err(anyhow::anyhow!("connection refused")) }));

    let mut cache = MockCustomerCache::new();
    cache.expect_is_available().return_const(false);
    cache.expect_get().never();

    let err = aggregate(
        customers,
        MockFieldValueStore::new(),
        MockFieldRegistryStorage::new(),
        cache,
    )
    .get(Uuid::now_v7())
    .await
    .unwrap_err();

    assert_matches!(err, CrmError::Storage(_));
}

#[tokio::test]
async fn it_should_not_serve_missing_customers_from_the_cache() {
    let mut customers = MockCustomerStorage::new();
    customers
        .expect_get_customer()
        .returning(|_| Box::pin(async { Ok(None) }));

    let mut cache = MockCustomerCache::new();
    cache.expect_evict().times(1).return_const(());
    cache.expect_get().never();

    let err = aggregate(
        customers,
        MockFieldValueStore::new(),
        MockFieldRegistryStorage::new(),
        cache,
    )
    .get(Uuid::now_v7())
    .await
    .unwrap_err();

    assert_matches!(err, CrmError::NotFound { resource: Resource::Customer, .. });
}

#[tokio::test]
async fn it_should_fetch_values_for_a_listing_in_one_call() {
    let notes = field("Notes", DataType::Text, None);
    let notes_id = notes.id;
    let now = Utc::now();
    let newer = customer("Jane Smith", now);
    let older = customer("John Doe", now - Duration::minutes(1));
    let (newer_id, older_id) = (newer.id, older.id);

    let mut customers = MockCustomerStorage::new();
    customers.expect_list_customers().times(1).returning(move || {
        let listed = vec![newer.clone(), older.clone()];
        Box::pin(async move { Ok(listed) })
    });

    let mut values = MockFieldValueStore::new();
    values.expect_get_values().never();
    values
        .expect_get_values_for_customers()
        .withf(move |ids| ids == &vec![newer_id, older_id])
        .times(1)
        .returning(move |_| {
            Box::pin(async move {
                Ok(HashMap::from([(
                    older_id,
                    vec![RawFieldValue {
                        field_id: notes_id,
                        value: "hello".to_string(),
                    }],
                )]))
            })
        });

    let records = aggregate(customers, values, fields_with(vec![notes]), write_only_cache())
        .list()
        .await
        .unwrap();

    assert_eq!(
        records.iter().map(|record| record.id).collect::<Vec<_>>(),
        vec![newer_id, older_id]
    );
    assert!(records[0].custom_field_values.is_empty());
    assert_eq!(
        records[1].custom_field_values.get(&notes_id),
        Some(&FieldValue::Text("hello".to_string()))
    );
}

#[tokio::test]
async fn it_should_treat_a_blank_search_as_a_listing() {
    let mut customers = MockCustomerStorage::new();
    customers.expect_search_customers().never();
    customers
        .expect_list_customers()
        .times(1)
        .returning(|| Box::pin(async { Ok(vec![]) }));

    let records = aggregate(
        customers,
        MockFieldValueStore::new(),
        MockFieldRegistryStorage::new(),
        write_only_cache(),
    )
    .search("   ")
    .await
    .unwrap();

    assert!(records.is_empty());
}

#[tokio::test]
async fn it_should_pass_a_trimmed_term_to_storage() {
    let mut customers = MockCustomerStorage::new();
    customers
        .expect_search_customers()
        .withf(|term| term == "jane")
        .times(1)
        .returning(|_| Box::pin(async { Ok(vec![]) }));

    let records = aggregate(
        customers,
        MockFieldValueStore::new(),
        MockFieldRegistryStorage::new(),
        write_only_cache(),
    )
    .search("  jane ")
    .await
    .unwrap();

    assert!(records.is_empty());
}

#[tokio::test]
async fn it_should_search_the_cache_when_storage_fails() {
    let now = Utc::now();
    let jane = CustomerRecord::assemble(customer("Jane Smith", now), BTreeMap::new());
    let john = CustomerRecord::assemble(
        customer("John Doe", now - Duration::minutes(1)),
        BTreeMap::new(),
    );

    let mut customers = MockCustomerStorage::new();
    customers
        .expect_search_customers()
        .returning(|_| Box::pin(async { Err(anyhow::anyhow!("connection refused")) }));

    let mut cache = MockCustomerCache::new();
    cache.expect_is_available().return_const(true);
    cache
        .expect_snapshot()
        .times(1)
        .return_const(vec![john, jane.clone()]);

    let records = aggregate(
        customers,
        MockFieldValueStore::new(),
        MockFieldRegistryStorage::new(),
        cache,
    )
    .search("JANE")
    .await
    .unwrap();

    assert_eq!(records, vec![jane]);
}

#[tokio::test]
async fn it_should_not_delete_an_unknown_customer() {
    let mut customers = MockCustomerStorage::new();
    customers
        .expect_delete_customer()
        .times(1)
        .returning(|_| Box::pin(async { Ok(false) }));

    let err = aggregate(
        customers,
        MockFieldValueStore::new(),
        MockFieldRegistryStorage::new(),
        write_only_cache(),
    )
    .delete(Uuid::now_v7())
    .await
    .unwrap_err();

    assert_matches!(err, CrmError::NotFound { resource: Resource::Customer, .. });
}

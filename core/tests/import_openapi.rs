use apisync_core::model::{ApiKeyPlacement, BodyMode, HttpMethod, KeyValue, RequestAuth};
use apisync_core::{
    convert, count_requests, parse_document, AuditStamp, CollectionItem, Dialect, ImportOptions,
    Importer, MemoryStore,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

const PETSTORE_V3: &str = r#"
openapi: 3.0.3
info:
  title: Petstore
  description: Sample store
servers:
  - url: https://petstore.example.com/v1
tags:
  - name: pet
    description: Everything about pets
paths:
  /pet:
    post:
      tags: [pet]
      summary: Add a new pet
      operationId: addPet
      requestBody:
        content:
          application/json:
            schema:
              $ref: '#/components/schemas/Pet'
      security:
        - petstore_auth: [write:pets]
  /pet/{petId}:
    parameters:
      - name: petId
        in: path
        required: true
        schema:
          type: integer
    get:
      tags: [pet]
      operationId: getPetById
      parameters:
        - $ref: '#/components/parameters/Verbose'
      security:
        - api_key: []
  /store/inventory:
    get:
      tags: [store]
      summary: Inventory
components:
  parameters:
    Verbose:
      name: verbose
      in: query
      schema:
        type: boolean
        default: false
  securitySchemes:
    api_key:
      type: apiKey
      name: api_key
      in: header
    petstore_auth:
      type: oauth2
      flows: {}
  schemas:
    Pet:
      type: object
      properties:
        id:
          type: integer
          example: 10
        name:
          type: string
          example: doggie
        category:
          $ref: '#/components/schemas/Category'
        status:
          type: string
          enum: [available, pending, sold]
    Category:
      type: object
      properties:
        name:
          type: string
        parent:
          $ref: '#/components/schemas/Category'
"#;

fn stamp() -> AuditStamp {
    AuditStamp::now("integration")
}

fn leaf_requests(items: &[CollectionItem]) -> Vec<&CollectionItem> {
    items
        .iter()
        .flat_map(|item| {
            if item.is_folder() {
                leaf_requests(&item.items)
            } else {
                vec![item]
            }
        })
        .collect()
}

#[test]
fn test_openapi_v3_end_to_end() {
    let document = parse_document(PETSTORE_V3).unwrap();
    let converted = convert(&document, &stamp()).unwrap();

    assert_eq!(converted.dialect, Dialect::OpenApi3);
    assert_eq!(converted.title, "Petstore");
    assert!(converted.diagnostics.is_empty());

    let keys: Vec<_> = converted.folders.keys().cloned().collect();
    assert_eq!(keys, vec!["pet", "store"]);
    assert_eq!(converted.folders["pet"].description, "Everything about pets");

    let add = &converted.folders["pet"].items[0];
    assert_eq!(add.name, "Add a new pet");
    let request = add.request.as_ref().unwrap();
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.url, "https://petstore.example.com/v1/pet");
    assert_eq!(request.selected_request_body_type, BodyMode::Json);
    let body: Value = serde_json::from_str(&request.body.raw).unwrap();
    assert_eq!(
        body,
        json!({
            "id": 10,
            "name": "doggie",
            "category": { "name": "", "parent": "" },
            "status": "available"
        })
    );
    // OAuth2 is not mapped.
    assert_eq!(request.auth, RequestAuth::None);

    let get = converted.folders["pet"].items[1].request.clone().unwrap();
    assert_eq!(get.url, "https://petstore.example.com/v1/pet/{petId}");
    assert_eq!(get.path_params, vec![KeyValue::new("petId", "")]);
    assert_eq!(get.query_params, vec![KeyValue::new("verbose", "false")]);
    assert_eq!(get.headers, vec![KeyValue::new("api_key", "")]);
    assert_eq!(
        get.auth,
        RequestAuth::ApiKey {
            auth_key: "api_key".into(),
            auth_value: String::new(),
            add_to: ApiKeyPlacement::Header,
        }
    );
}

#[test]
fn test_every_operation_becomes_one_request_with_a_url() {
    let document = parse_document(PETSTORE_V3).unwrap();
    let operations = document["paths"]
        .as_object()
        .unwrap()
        .values()
        .flat_map(|item| item.as_object().unwrap().keys())
        .filter(|key| HttpMethod::parse(key).is_some())
        .count();

    let items = convert(&document, &stamp()).unwrap().into_items();
    let requests = leaf_requests(&items);

    assert_eq!(operations, 3);
    assert_eq!(requests.len(), operations);
    assert_eq!(count_requests(&items), operations);
    assert!(requests
        .iter()
        .all(|item| !item.request.as_ref().unwrap().url.is_empty()));
}

#[test]
fn test_openapi_v2_with_definitions() {
    let document = json!({
        "swagger": "2.0",
        "info": { "title": "Swagger Petstore" },
        "host": "petstore.swagger.io",
        "basePath": "/v2",
        "schemes": ["https", "http"],
        "paths": {
            "/pet/findByStatus": { "get": {
                "tags": ["pet"],
                "summary": "Finds Pets by status",
                "parameters": [{ "name": "status", "in": "query", "type": "array", "items": { "type": "string" }, "x-example": "available" }]
            } },
            "/user": { "post": {
                "tags": ["user"],
                "summary": "Create user",
                "parameters": [{ "in": "body", "name": "body", "schema": { "$ref": "#/definitions/User" } }]
            } }
        },
        "definitions": {
            "User": { "type": "object", "properties": {
                "username": { "type": "string", "example": "theUser" },
                "friends": { "type": "array", "items": { "$ref": "#/definitions/User" } }
            } }
        }
    });
    let converted = convert(&document, &stamp()).unwrap();
    assert_eq!(converted.dialect, Dialect::OpenApi2);

    let find = converted.folders["pet"].items[0].request.clone().unwrap();
    assert_eq!(find.url, "https://petstore.swagger.io/v2/pet/findByStatus");
    assert_eq!(find.query_params, vec![KeyValue::new("status", "available")]);

    let create = converted.folders["user"].items[0].request.clone().unwrap();
    let body: Value = serde_json::from_str(&create.body.raw).unwrap();
    assert_eq!(body, json!({ "username": "theUser", "friends": [] }));
}

#[test]
fn test_missing_reference_is_reported_not_fatal() {
    let document = json!({
        "openapi": "3.0.3",
        "info": { "title": "Broken" },
        "components": { "schemas": {} },
        "paths": { "/a": { "post": {
            "requestBody": { "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Gone" } } } }
        } } }
    });
    let converted = convert(&document, &stamp()).unwrap();

    assert_eq!(converted.diagnostics.len(), 1);
    assert_eq!(converted.folders["default"].items.len(), 1);
}

#[test]
fn test_import_into_store_counts_requests() {
    let document = parse_document(PETSTORE_V3).unwrap();
    let mut importer = Importer::new(MemoryStore::new());
    let outcome = importer
        .import(&document, &ImportOptions::new("workspace", "integration"))
        .unwrap();

    assert_eq!(outcome.collection.name, "Petstore");
    assert_eq!(outcome.collection.description, "Sample store");
    assert_eq!(outcome.collection.total_requests, 3);
    assert_eq!(outcome.collection.created_by, "integration");
}

#[test]
fn test_unrecognized_document_is_rejected() {
    let document = parse_document("title: not an api\n").unwrap();
    let err = convert(&document, &stamp()).unwrap_err();
    assert!(err.to_string().starts_with("Invalid specification"));
}

//! Executors driven through the registry against a scripted generation service.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use canvasflow_config::{
  AppBuilderConfig, EngineSettings, ImageConfig, NodeConfig, NodeDef, NodeKind, PaletteConfig,
  PromptEnhancerConfig, ScreenConfig, TextConfig, TypographyConfig,
};
use canvasflow_host_http::{
  GenerationRequest, GenerationService, NoJitter, Operation, ServiceError,
};
use canvasflow_task_runtime::{
  ErrorKind, ExecutorRegistry, FALLBACK_PALETTE, InputBundle, TaskError,
};
use serde_json::{Value, json};

type Handler = Box<dyn Fn(&GenerationRequest) -> Result<Value, ServiceError> + Send + Sync>;

/// Answers every request with `handler` and records what it was asked.
struct ScriptedService {
  handler: Handler,
  requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedService {
  fn new(
    handler: impl Fn(&GenerationRequest) -> Result<Value, ServiceError> + Send + Sync + 'static,
  ) -> Arc<Self> {
    Arc::new(Self {
      handler: Box::new(handler),
      requests: Mutex::new(Vec::new()),
    })
  }

  fn requests(&self) -> Vec<GenerationRequest> {
    self.requests.lock().unwrap().clone()
  }

  fn count(&self, operation: Operation) -> usize {
    self
      .requests
      .lock()
      .unwrap()
      .iter()
      .filter(|r| r.operation == operation)
      .count()
  }
}

#[async_trait]
impl GenerationService for ScriptedService {
  async fn generate(&self, request: &GenerationRequest) -> Result<Value, ServiceError> {
    self.requests.lock().unwrap().push(request.clone());
    (self.handler)(request)
  }
}

fn registry(service: Arc<ScriptedService>) -> ExecutorRegistry {
  let settings = EngineSettings {
    base_delay_ms: 0,
    ..EngineSettings::default()
  };
  ExecutorRegistry::standard_with_jitter(service, &settings, Arc::new(NoJitter))
}

async fn run(
  registry: &ExecutorRegistry,
  node: &NodeDef,
  inputs: &InputBundle,
) -> Result<Value, TaskError> {
  let executor = registry
    .get(node.kind())
    .unwrap_or_else(|| panic!("no executor for {}", node.kind()));
  executor.execute(node, inputs).await
}

fn bundle(entries: &[(&str, Value)]) -> InputBundle {
  entries
    .iter()
    .map(|(handle, value)| (handle.to_string(), value.clone()))
    .collect()
}

#[tokio::test]
async fn test_text_node_needs_no_service() {
  let service = ScriptedService::new(|_| panic!("text nodes must not call out"));
  let registry = registry(service.clone());
  let node = NodeDef::new(
    "idea",
    NodeConfig::Text(TextConfig {
      value: "a cozy coffee shop".to_string(),
      aspect_ratio: None,
    }),
  );

  let output = run(&registry, &node, &InputBundle::new()).await.unwrap();
  assert_eq!(output["text"], "a cozy coffee shop");
  assert!(service.requests().is_empty());
}

#[tokio::test]
async fn test_enhancer_renders_instruction_template() {
  let service = ScriptedService::new(|request| Ok(json!({ "text": format!("{}!!", request.prompt) })));
  let registry = registry(service.clone());
  let node = NodeDef::new(
    "enhance",
    NodeConfig::PromptEnhancer(PromptEnhancerConfig {
      instructions: Some("Describe vividly: {{ prompt }}".to_string()),
      style: Some("watercolor".to_string()),
    }),
  );
  let inputs = bundle(&[("prompt", json!({ "text": "a lighthouse" }))]);

  let output = run(&registry, &node, &inputs).await.unwrap();

  assert_eq!(output["original_prompt"], "a lighthouse");
  assert_eq!(output["detailed_prompt"], "Describe vividly: a lighthouse!!");
  let sent = service.requests();
  assert_eq!(sent.len(), 1);
  assert_eq!(sent[0].operation, Operation::Text);
  assert_eq!(sent[0].params["style"], "watercolor");
}

#[tokio::test]
async fn test_image_uses_upstream_detailed_prompt() {
  let service = ScriptedService::new(|_| Ok(json!({ "image_url": "https://cdn.example/1.png" })));
  let registry = registry(service.clone());
  let node = NodeDef::new("img", NodeConfig::Image(ImageConfig::default()));
  let inputs = bundle(&[(
    "prompt",
    json!({ "detailed_prompt": "a lighthouse at dusk", "original_prompt": "a lighthouse" }),
  )]);

  let output = run(&registry, &node, &inputs).await.unwrap();

  assert_eq!(output["image_url"], "https://cdn.example/1.png");
  assert_eq!(output["prompt"], "a lighthouse at dusk");
  assert_eq!(output["aspect_ratio"], "1:1");
  assert_eq!(service.requests()[0].params["aspect_ratio"], "1:1");
}

#[tokio::test]
async fn test_image_rejects_bad_prompts_without_calling_out() {
  let service = ScriptedService::new(|_| Ok(json!("unused")));
  let registry = registry(service.clone());
  let node = NodeDef::new("img", NodeConfig::Image(ImageConfig::default()));

  let missing = run(&registry, &node, &InputBundle::new()).await.unwrap_err();
  assert_eq!(missing.kind(), ErrorKind::Input);

  let short = bundle(&[("prompt", json!({ "text": " ab " }))]);
  let too_short = run(&registry, &node, &short).await.unwrap_err();
  assert_eq!(too_short.kind(), ErrorKind::Input);

  let shapeless = bundle(&[("prompt", json!({ "colors": ["#fff"] }))]);
  let unusable = run(&registry, &node, &shapeless).await.unwrap_err();
  assert_eq!(unusable.kind(), ErrorKind::Input);

  assert!(service.requests().is_empty());
}

#[tokio::test]
async fn test_image_retries_transient_failures() {
  let attempts = Arc::new(Mutex::new(0));
  let counter = attempts.clone();
  let service = ScriptedService::new(move |_| {
    let mut n = counter.lock().unwrap();
    *n += 1;
    if *n < 3 {
      Err(ServiceError::status(503, "busy"))
    } else {
      Ok(json!("https://cdn.example/late.png"))
    }
  });
  let registry = registry(service.clone());
  let node = NodeDef::new("img", NodeConfig::Image(ImageConfig::default()));
  let inputs = bundle(&[("prompt", json!("a red bicycle"))]);

  let output = run(&registry, &node, &inputs).await.unwrap();
  assert_eq!(output["image_url"], "https://cdn.example/late.png");
  assert_eq!(service.count(Operation::Image), 3);
}

#[tokio::test]
async fn test_image_does_not_retry_rejections() {
  let service = ScriptedService::new(|_| Err(ServiceError::status(400, "prompt rejected")));
  let registry = registry(service.clone());
  let node = NodeDef::new("img", NodeConfig::Image(ImageConfig::default()));
  let inputs = bundle(&[("prompt", json!("a red bicycle"))]);

  let err = run(&registry, &node, &inputs).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NonTransientService);
  assert_eq!(service.count(Operation::Image), 1);
}

#[tokio::test]
async fn test_palette_falls_back_for_unusable_source() {
  let service = ScriptedService::new(|_| Ok(json!({ "colors": ["#000000"] })));
  let registry = registry(service.clone());
  let node = NodeDef::new("colors", NodeConfig::Palette(PaletteConfig::default()));
  let inputs = bundle(&[("source", json!({ "width": 1024 }))]);

  let output = run(&registry, &node, &inputs).await.unwrap();

  assert_eq!(output["colors"], json!(FALLBACK_PALETTE));
  assert_eq!(output["fallback"], true);
  assert!(service.requests().is_empty());
}

#[tokio::test]
async fn test_palette_falls_back_for_colorless_response() {
  let service = ScriptedService::new(|_| Ok(json!({ "description": "warm and earthy" })));
  let registry = registry(service.clone());
  let node = NodeDef::new("colors", NodeConfig::Palette(PaletteConfig::default()));
  let inputs = bundle(&[("source", json!({ "text": "autumn forest" }))]);

  let output = run(&registry, &node, &inputs).await.unwrap();
  assert_eq!(output["colors"], json!(FALLBACK_PALETTE));
  assert_eq!(service.count(Operation::Palette), 1);
}

#[tokio::test]
async fn test_palette_from_image_source() {
  let service = ScriptedService::new(|_| Ok(json!({ "colors": ["#aa3300", "#ffeedd"], "name": "Rust" })));
  let registry = registry(service.clone());
  let node = NodeDef::new(
    "colors",
    NodeConfig::Palette(PaletteConfig {
      mood: Some("calm".to_string()),
    }),
  );
  let inputs = bundle(&[("source", json!({ "image_url": "https://cdn.example/1.png" }))]);

  let output = run(&registry, &node, &inputs).await.unwrap();

  assert_eq!(output["colors"], json!(["#AA3300", "#FFEEDD"]));
  assert_eq!(output["name"], "Rust");
  assert_eq!(output["fallback"], false);
  let sent = service.requests();
  assert_eq!(sent[0].params["image_url"], "https://cdn.example/1.png");
  assert_eq!(sent[0].params["mood"], "calm");
}

#[tokio::test]
async fn test_palette_requires_source() {
  let service = ScriptedService::new(|_| Ok(json!({})));
  let registry = registry(service);
  let node = NodeDef::new("colors", NodeConfig::Palette(PaletteConfig::default()));

  let err = run(&registry, &node, &InputBundle::new()).await.unwrap_err();
  assert!(matches!(err, TaskError::MissingInput { ref handle, .. } if handle == "source"));
}

#[tokio::test]
async fn test_palette_ignores_input_on_other_handle() {
  let service = ScriptedService::new(|_| Ok(json!({ "colors": ["#112233"] })));
  let registry = registry(service.clone());
  let node = NodeDef::new("colors", NodeConfig::Palette(PaletteConfig::default()));
  let inputs = bundle(&[("prompt", json!({ "text": "a rainy harbor at dusk" }))]);

  let err = run(&registry, &node, &inputs).await.unwrap_err();
  assert!(matches!(err, TaskError::MissingInput { ref handle, .. } if handle == "source"));
  assert_eq!(err.kind(), ErrorKind::Input);
  assert!(service.requests().is_empty());
}

#[tokio::test]
async fn test_typography_from_palette() {
  let service = ScriptedService::new(|_| {
    Ok(json!({ "heading_font": "Playfair Display", "body_font": "Inter" }))
  });
  let registry = registry(service.clone());
  let node = NodeDef::new("type", NodeConfig::Typography(TypographyConfig::default()));
  let inputs = bundle(&[("source", json!({ "colors": ["#111111", "#EEEEEE"], "fallback": false }))]);

  let output = run(&registry, &node, &inputs).await.unwrap();

  assert_eq!(output["heading_font"], "Playfair Display");
  assert_eq!(output["body_font"], "Inter");
  assert_eq!(
    service.requests()[0].prompt,
    "A brand using the colors #111111, #EEEEEE"
  );
}

#[tokio::test]
async fn test_typography_incomplete_response_is_service_error() {
  let service = ScriptedService::new(|_| Ok(json!({ "heading_font": "Lora" })));
  let registry = registry(service);
  let node = NodeDef::new("type", NodeConfig::Typography(TypographyConfig::default()));
  let inputs = bundle(&[("source", json!("a law firm"))]);

  let err = run(&registry, &node, &inputs).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NonTransientService);
}

#[tokio::test]
async fn test_app_builder_validates_configuration() {
  let service = ScriptedService::new(|_| Ok(json!({})));
  let registry = registry(service);

  let no_screens = NodeDef::new(
    "app",
    NodeConfig::AppBuilder(AppBuilderConfig {
      description: "a recipe sharing app".to_string(),
      screens: vec![" ".to_string()],
    }),
  );
  let err = run(&registry, &no_screens, &InputBundle::new()).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Configuration);

  let short = NodeDef::new(
    "app",
    NodeConfig::AppBuilder(AppBuilderConfig {
      description: "recipes".to_string(),
      screens: vec!["Home".to_string()],
    }),
  );
  let err = run(&registry, &short, &InputBundle::new()).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[tokio::test]
async fn test_screen_keeps_placeholders_whose_images_failed() {
  let markup = concat!(
    "<header>[[icon:shopping cart]]</header>",
    "<img src=\"[[image:fresh croissants]]\">",
    "<img src=\"[[image:broken oven]]\">",
    "<img src=\"[[image:fresh croissants]]\">",
  );
  let service = ScriptedService::new(move |request| match request.operation {
    Operation::Screen => Ok(json!({ "html": markup })),
    Operation::Image if request.prompt == "broken oven" => {
      Err(ServiceError::status(422, "unsafe content"))
    }
    Operation::Image => Ok(json!({ "url": format!("https://cdn.example/{}.png", request.prompt.replace(' ', "-")) })),
    _ => Err(ServiceError::status(404, "unexpected operation")),
  });
  let registry = registry(service.clone());
  let node = NodeDef::new(
    "home",
    NodeConfig::Screen(ScreenConfig {
      screen_name: Some("Home".to_string()),
    }),
  );
  let inputs = bundle(&[("prompt", json!({ "text": "a bakery landing page" }))]);

  let output = run(&registry, &node, &inputs).await.unwrap();

  assert_eq!(output["images"], json!({ "succeeded": 2, "total": 3 }));
  assert_eq!(
    output["html"],
    concat!(
      "<header>https://cdn.example/shopping-cart.png</header>",
      "<img src=\"https://cdn.example/fresh-croissants.png\">",
      "<img src=\"[[image:broken oven]]\">",
      "<img src=\"https://cdn.example/fresh-croissants.png\">",
    )
  );
  assert_eq!(service.count(Operation::Screen), 1);
  assert_eq!(service.count(Operation::Image), 3);

  let icon = service
    .requests()
    .into_iter()
    .find(|r| r.prompt == "shopping cart")
    .unwrap();
  assert_eq!(icon.params["aspect_ratio"], "1:1");
}

#[tokio::test]
async fn test_screen_renders_selected_screen_of_plan() {
  let service = ScriptedService::new(|request| match request.operation {
    Operation::Screen => Ok(json!(format!("<h1>{}</h1>", request.prompt))),
    _ => Err(ServiceError::status(404, "unexpected operation")),
  });
  let registry = registry(service.clone());

  let builder = NodeDef::new(
    "app",
    NodeConfig::AppBuilder(AppBuilderConfig {
      description: "a recipe sharing app".to_string(),
      screens: vec!["Home".to_string(), "Profile".to_string()],
    }),
  );
  let palette = json!({ "colors": ["#123456"], "fallback": false });
  let plan = run(&registry, &builder, &bundle(&[("palette", palette.clone())]))
    .await
    .unwrap();

  let screen = NodeDef::new(
    "profile",
    NodeConfig::Screen(ScreenConfig {
      screen_name: Some("profile".to_string()),
    }),
  );
  let output = run(&registry, &screen, &bundle(&[("plan", plan)]))
    .await
    .unwrap();

  assert_eq!(output["screen_name"], "Profile");
  assert_eq!(output["prompt"], "Profile screen for: a recipe sharing app");
  assert_eq!(output["images"], json!({ "succeeded": 0, "total": 0 }));
  let sent = service.requests();
  assert_eq!(sent.len(), 1);
  assert_eq!(sent[0].params["screen_name"], "Profile");
  assert_eq!(sent[0].params["palette"], palette);
}

#[tokio::test]
async fn test_screen_fails_for_unknown_plan_screen() {
  let service = ScriptedService::new(|_| Ok(json!("<main/>")));
  let registry = registry(service.clone());
  let plan = json!({
    "description": "a recipe sharing app",
    "screens": [{ "name": "Home", "prompt": "Home screen for: a recipe sharing app" }]
  });
  let screen = NodeDef::new(
    "settings",
    NodeConfig::Screen(ScreenConfig {
      screen_name: Some("Settings".to_string()),
    }),
  );

  let err = run(&registry, &screen, &bundle(&[("plan", plan)]))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Input);
  assert!(service.requests().is_empty());
}

#[tokio::test]
async fn test_registry_has_every_kind() {
  let registry = registry(ScriptedService::new(|_| Ok(json!({}))));
  for kind in NodeKind::ALL {
    assert!(registry.contains(kind), "missing executor for {}", kind);
  }
}

#[tokio::test]
async fn test_transient_exhaustion_reports_transient_kind() {
  let service = ScriptedService::new(|_| Err(ServiceError::transport("connection reset")));
  let settings = EngineSettings {
    max_attempts: 2,
    base_delay_ms: 1,
    ..EngineSettings::default()
  };
  let registry = ExecutorRegistry::standard_with_jitter(service.clone(), &settings, Arc::new(NoJitter));
  let node = NodeDef::new("img", NodeConfig::Image(ImageConfig::default()));

  let started = std::time::Instant::now();
  let err = run(&registry, &node, &bundle(&[("prompt", json!("a red bicycle"))]))
    .await
    .unwrap_err();

  assert_eq!(err.kind(), ErrorKind::TransientService);
  assert_eq!(service.count(Operation::Image), 2);
  assert!(started.elapsed() >= Duration::from_millis(1));
}

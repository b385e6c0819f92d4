//! Embedded default templates
//!
//! Generation works with no templates directory on disk: every artifact
//! family ships a default here, and an on-disk root overrides it by
//! relative path. Keys are exported as constants so generators and
//! templates never drift apart.

pub const WORKER_INDEX: &str = "worker/index.js.tmpl";
pub const DOMAINS_CONFIG: &str = "config/domains.js.tmpl";
pub const ROUTER_MIDDLEWARE: &str = "middleware/router.js.tmpl";
pub const ERROR_MIDDLEWARE: &str = "middleware/error-handler.js.tmpl";
pub const STATIC_SITE_MIDDLEWARE: &str = "middleware/static-site.js.tmpl";
pub const STATIC_SITE_SCHEMA: &str = "static-site-schema.json.tmpl";
pub const CI_WORKFLOW: &str = "ci/ci.yml.tmpl";
pub const DEPLOY_WORKFLOW: &str = "ci/deploy.yml.tmpl";
pub const DOCKER_COMPOSE: &str = "docker-compose.yml.tmpl";
pub const GITIGNORE: &str = "gitignore.tmpl";
pub const README: &str = "readme/README.md.tmpl";
pub const DEPLOY_SCRIPT: &str = "scripts/deploy.sh.tmpl";
pub const SMOKE_TEST: &str = "tests/smoke.test.js.tmpl";

pub const README_USAGE_PARTIAL: &str = "readme/usage.md";
pub const README_DEPLOYMENT_PARTIAL: &str = "readme/deployment.md";

/// Embedded template text for `key`, if one ships with the tool.
pub fn template(key: &str) -> Option<&'static str> {
    match key {
        WORKER_INDEX => Some(WORKER_INDEX_TEXT),
        DOMAINS_CONFIG => Some(DOMAINS_CONFIG_TEXT),
        ROUTER_MIDDLEWARE => Some(ROUTER_MIDDLEWARE_TEXT),
        ERROR_MIDDLEWARE => Some(ERROR_MIDDLEWARE_TEXT),
        STATIC_SITE_MIDDLEWARE => Some(STATIC_SITE_MIDDLEWARE_TEXT),
        STATIC_SITE_SCHEMA => Some(STATIC_SITE_SCHEMA_TEXT),
        CI_WORKFLOW => Some(CI_WORKFLOW_TEXT),
        DEPLOY_WORKFLOW => Some(DEPLOY_WORKFLOW_TEXT),
        DOCKER_COMPOSE => Some(DOCKER_COMPOSE_TEXT),
        GITIGNORE => Some(GITIGNORE_TEXT),
        README => Some(README_TEXT),
        DEPLOY_SCRIPT => Some(DEPLOY_SCRIPT_TEXT),
        SMOKE_TEST => Some(SMOKE_TEST_TEXT),
        _ => None,
    }
}

/// Embedded partial text for `key`.
pub fn partial(key: &str) -> Option<&'static str> {
    match key {
        README_USAGE_PARTIAL => Some(README_USAGE_TEXT),
        README_DEPLOYMENT_PARTIAL => Some(README_DEPLOYMENT_TEXT),
        _ => None,
    }
}

const WORKER_INDEX_TEXT: &str = r#"import { createRouter } from '../middleware/router.js';
import { errorHandler } from '../middleware/errorHandler.js';
import { DOMAINS } from '../config/domains.js';

const router = createRouter();

router.get('{{ api.health_path }}', () =>
  Response.json({ status: 'ok', service: '{{ service.name }}' })
);

export default {
  async fetch(request, env, ctx) {
    try {
      return await router.handle(request, env, ctx, DOMAINS);
    } catch (err) {
      return errorHandler(err, request);
    }
  },
};
"#;

const DOMAINS_CONFIG_TEXT: &str = r#"// Per-environment endpoints for {{ service.display_name }}
export const DOMAINS = {
  production: '{{ urls.production }}',
  staging: '{{ urls.staging }}',
  development: '{{ urls.development }}',
};

export const API_BASE_PATH = '{{ api.base_path }}';
"#;

const ROUTER_MIDDLEWARE_TEXT: &str = r#"export function createRouter() {
  const routes = [];
  return {
    get(path, handler) {
      routes.push({ method: 'GET', path, handler });
    },
    post(path, handler) {
      routes.push({ method: 'POST', path, handler });
    },
    async handle(request, env, ctx, domains) {
      const url = new URL(request.url);
      for (const route of routes) {
        if (route.method === request.method && route.path === url.pathname) {
          return route.handler(request, env, ctx, domains);
        }
      }
      return new Response('Not found', { status: 404 });
    },
  };
}
"#;

const ERROR_MIDDLEWARE_TEXT: &str = r#"export function errorHandler(err, request) {
  console.error(`[{{ service.name }}] unhandled error for ${request.url}`, err);
  return Response.json(
    { error: 'Internal error', requestId: request.headers.get('cf-ray') },
    { status: 500 }
  );
}
"#;

const STATIC_SITE_MIDDLEWARE_TEXT: &str = r#"// Serves the static asset bucket with SPA-style fallback.
export class StaticSiteMiddleware {
  constructor(env) {
    this.env = env;
  }

  async serve(request) {
    const url = new URL(request.url);
    const key = url.pathname === '/' ? 'index.html' : url.pathname.slice(1);
    const asset = await this.env.__STATIC_CONTENT.get(key, 'arrayBuffer');
    if (asset === null) {
      const fallback = await this.env.__STATIC_CONTENT.get('index.html', 'arrayBuffer');
      return new Response(fallback, { headers: { 'content-type': 'text/html' } });
    }
    return new Response(asset);
  }
}
"#;

const STATIC_SITE_SCHEMA_TEXT: &str = r#"{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "title": "{{ service.display_name }} static site settings",
  "type": "object",
  "properties": {
    "bucket": { "type": "string", "default": "./public" },
    "include": { "type": "array", "items": { "type": "string" } },
    "exclude": { "type": "array", "items": { "type": "string" } }
  },
  "required": ["bucket"]
}
"#;

const CI_WORKFLOW_TEXT: &str = r#"name: CI

on:
  push:
    branches: [main]
  pull_request:

jobs:
  test:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4
      - uses: actions/setup-node@v4
        with:
          node-version: 20
      - run: npm ci
      - run: npm run lint
      - run: npm test
"#;

const DEPLOY_WORKFLOW_TEXT: &str = r#"name: Deploy

on:
  push:
    branches: [main]

jobs:
  deploy:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4
      - uses: actions/setup-node@v4
        with:
          node-version: 20
      - run: npm ci
      - name: Deploy {{ service.worker_name }}
        run: npx wrangler deploy --env {{ environment }}
        env:
          CLOUDFLARE_API_TOKEN: ${{ secrets.CLOUDFLARE_API_TOKEN }}
          CLOUDFLARE_ACCOUNT_ID: {{ cloudflare.account_id }}
"#;

const DOCKER_COMPOSE_TEXT: &str = r#"services:
  {{ service.name }}:
    image: node:20-alpine
    working_dir: /app
    command: npx wrangler dev --ip 0.0.0.0
    volumes:
      - .:/app
    ports:
      - "8787:8787"
    environment:
      - ENVIRONMENT={{ environment }}
"#;

const GITIGNORE_TEXT: &str = r#"node_modules/
dist/
.wrangler/
.dev.vars
*.log
.DS_Store
"#;

const README_TEXT: &str = r#"# {{ service.display_name }}

{{ service.description }}

- Type: `{{ service.type }}`
- Domain: `{{ domain.name }}`
- Health check: `{{ api.health_path }}`

{{> readme/usage.md }}

{{> readme/deployment.md }}
"#;

const README_USAGE_TEXT: &str = r#"## Usage

```sh
npm install
npm run dev
```

The service listens on {{ urls.development }} during local development.
"#;

const README_DEPLOYMENT_TEXT: &str = r#"## Deployment

```sh
npm run deploy
```

Deploys `{{ service.worker_name }}` to {{ urls.production }}.
"#;

const DEPLOY_SCRIPT_TEXT: &str = r#"#!/usr/bin/env bash
set -euo pipefail

ENVIRONMENT="${1:-{{ environment }}}"

echo "Deploying {{ service.worker_name }} to ${ENVIRONMENT}"
npx wrangler deploy --env "${ENVIRONMENT}"
"#;

const SMOKE_TEST_TEXT: &str = r#"import { describe, it, expect } from 'vitest';

const BASE_URL = process.env.SMOKE_BASE_URL ?? '{{ urls.development }}';

describe('{{ service.name }} smoke', () => {
  it('answers the health check', async () => {
    const res = await fetch(new URL('{{ api.health_path }}', BASE_URL));
    expect(res.status).toBe(200);
    const body = await res.json();
    expect(body.status).toBe('ok');
  });
});
"#;
